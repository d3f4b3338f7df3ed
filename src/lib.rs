//! docx-merge - merge Word (.docx) documents into one
//!
//! Each input is preprocessed before the documents are combined:
//!
//! - **Content-part normalization**: `mc:AlternateContent` wrappers around
//!   `w:contentPart` ink references collapse to their fallback markup, which
//!   every consumer understands
//! - **Style collision resolution**: a style whose name (or identifier) an
//!   earlier document already used is renamed, and every reference to it in
//!   the body, headers, footers and numbering follows
//!
//! The preprocessed packages are then composed in input order, each keeping
//! its own section properties: page size, margins, headers and footers.
//!
//! # Example - Merging files
//!
//! ```no_run
//! use docx_merge::merge::{MergeOptions, merge_files};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! merge_files(&["cover.docx", "report.docx"], "merged.docx", &MergeOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Merging in memory
//!
//! ```no_run
//! use docx_merge::merge::{MergeOptions, NamePolicy, merge_bytes};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let first = std::fs::read("a.docx")?;
//! let second = std::fs::read("b.docx")?;
//!
//! // Keep human-readable style names, only disambiguate identifiers
//! let options = MergeOptions::new().with_name_policy(NamePolicy::Preserve);
//! let merged = merge_bytes(&[first, second], &options)?;
//! std::fs::write("merged.docx", merged)?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod merge;
pub mod ooxml;

pub use common::{Error, Result};
pub use merge::{MergeOptions, NamePolicy, merge_bytes, merge_files};
