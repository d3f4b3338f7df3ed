//! Errors raised while interpreting a package as a Word document.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OoxmlError>;

#[derive(Error, Debug)]
pub enum OoxmlError {
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// A part held XML that could not be parsed or written
    #[error("XML error: {0}")]
    Xml(String),

    /// A part the document cannot do without is missing
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// The package is not a word-processing document
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },
}

impl From<crate::common::xml::XmlError> for OoxmlError {
    fn from(err: crate::common::xml::XmlError) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
