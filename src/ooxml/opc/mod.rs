//! Open Packaging Conventions (OPC) implementation.
//!
//! Covers the package structure (parts, relationships), content type
//! management, and ZIP-based physical packaging for reading and writing
//! Office Open XML documents.

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use rel::{Relationship, Relationships};
