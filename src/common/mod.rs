//! Types shared by the package layer and the merge pipeline.

pub mod error;
pub mod xml;

pub use error::{Error, Result};
