//! Conversions from the layer-specific errors into the crate-level [`Error`].

use super::types::Error;
use crate::common::xml::XmlError;
use crate::ooxml::error::OoxmlError;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::IoError(e) => Error::Io(e),
            OpcError::ZipError(e) => Error::ZipError(e.to_string()),
            OpcError::XmlError(s) => Error::XmlError(s),
            OpcError::PartNotFound(s)
            | OpcError::PackageNotFound(s)
            | OpcError::RelationshipNotFound(s)
            | OpcError::ContentTypeNotFound(s) => Error::ComponentNotFound(s),
            OpcError::InvalidPackUri(_) | OpcError::InvalidRelationship(_) => {
                Error::InvalidFormat(err.to_string())
            },
        }
    }
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::Opc(e) => Error::from(e),
            OoxmlError::Xml(s) => Error::XmlError(s),
            OoxmlError::PartNotFound(s) => Error::ComponentNotFound(s),
            OoxmlError::InvalidContentType { expected, got } => {
                Error::InvalidContentType { expected, got }
            },
        }
    }
}

impl From<XmlError> for Error {
    fn from(err: XmlError) -> Self {
        Error::XmlError(err.to_string())
    }
}
