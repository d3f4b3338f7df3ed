//! Crate-level error type returned by the merge entry points.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for merge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A package part, relationship or content type is missing
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Invalid content type
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Merge called without any input
    #[error("No source documents to merge")]
    NoSources,

    /// A single input could not be read or preprocessed
    #[error("Failed to process {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The merged package could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Attach the path of the input that caused this error.
    pub fn for_input(self, path: impl Into<PathBuf>) -> Self {
        Error::Input {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, Error>;
