//! Unified error type for the crate.
//!
//! Layer errors (`OpcError`, `OoxmlError`, `XmlError`) convert into
//! [`Error`] so the merge entry points expose a single type.

pub mod conversions;
pub mod types;

pub use types::{Error, Result};
