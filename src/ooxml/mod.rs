//! Office Open XML (OOXML) packages.
//!
//! The implementation is based on the Open Packaging Conventions (OPC):
//!
//! 1. **OPC Layer** (`opc`): package handling (ZIP, parts, relationships)
//! 2. **Errors** (`error`): failures while reading or writing parts
//! 3. **Word** (`docx`): Word packages and the merge passes over them
pub mod docx;
pub mod error;
pub mod opc;

pub use opc::{OpcPackage, PackURI};
