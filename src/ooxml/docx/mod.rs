//! Word (.docx) packages and the passes run over them before merging.
//!
//! # Architecture
//!
//! - `WordPackage`: a Word package with its main document located
//! - `content_part`: collapses `mc:AlternateContent` wrappers around
//!   `w:contentPart` ink to their fallback markup
//! - `styles`: renames styles whose name or identifier another document
//!   already used, so appended content keeps its own formatting
//! - `references`: the style reference sites rewritten after a rename
//! - `compose`: appends several packages into one
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_merge::merge::MergeOptions;
//! use docx_merge::ooxml::docx::{StyleRegistry, StyleResolver, WordPackage};
//!
//! let mut registry = StyleRegistry::new();
//! let resolver = StyleResolver::new(&MergeOptions::default());
//!
//! let mut pkg = WordPackage::open("chapter.docx")?;
//! let report = resolver.resolve(&mut pkg, 0, &mut registry)?;
//! println!("renamed {} styles", report.renames.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod compose;
pub mod content_part;
pub mod package;
pub mod references;
pub mod styles;

#[cfg(test)]
pub(crate) mod fixture;

pub use compose::{Composer, SectionComposer, Source};
pub use content_part::normalize_content_parts;
pub use package::WordPackage;
pub use references::update_style_references;
pub use styles::{ResolveReport, StyleRegistry, StyleRename, StyleResolver};
