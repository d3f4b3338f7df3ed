//! Mutable XML trees for package parts.
//!
//! Parts are parsed into an arena-backed [`XmlDocument`] with parent links,
//! mutated in place, and serialized back with [`serialize`].

pub mod arena;
pub mod builder;
pub mod escape;
pub mod parser;
pub mod xname;

use thiserror::Error;

pub use arena::{XmlDocument, XmlNode};
pub use builder::serialize;
pub use escape::{escape_xml, unescape_xml};
pub use parser::parse;
pub use xname::{MC_NS, R_NS, W_NS, XAttribute, XName};

/// Errors raised while reading or writing XML trees.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("invalid UTF-8 in XML: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("XML write error: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, XmlError>;
