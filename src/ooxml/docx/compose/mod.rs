//! Composition of several Word packages into one.
//!
//! The first source is the base: its package, settings, theme and section
//! layout carry over. Every later source contributes its body content along
//! with the styles, numbering, notes, comments and related parts that
//! content needs.

mod ids;
mod parts;
mod relmap;
mod section;

pub use section::SectionComposer;

use crate::common::error::Result;

/// One input document handed to a [`Composer`].
#[derive(Debug, Clone)]
pub struct Source {
    bytes: Vec<u8>,
    keep_sections: bool,
}

impl Source {
    /// Wrap a serialized package. Section breaks are kept by default.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            keep_sections: true,
        }
    }

    /// Whether the source's final section properties survive the merge.
    pub fn with_keep_sections(mut self, keep: bool) -> Self {
        self.keep_sections = keep;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn keep_sections(&self) -> bool {
        self.keep_sections
    }
}

/// Combines sources into a single serialized package, in order.
pub trait Composer {
    fn compose(&self, sources: &[Source]) -> Result<Vec<u8>>;
}
