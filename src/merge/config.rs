/// Configuration types for merging documents.
///
/// This module defines the options that tune the preprocessing passes and the
/// composer.
///
/// # Examples
///
/// ```rust
/// use docx_merge::merge::{MergeOptions, NamePolicy};
///
/// // Create with defaults
/// let options = MergeOptions::default();
///
/// // Or customize
/// let options = MergeOptions::new()
///     .with_keep_sections(false)
///     .with_name_policy(NamePolicy::Preserve);
/// ```
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Whether every source keeps its own section properties
    pub keep_sections: bool,
    /// Whether a reused style identifier counts as a collision
    pub detect_id_collisions: bool,
    /// What happens to a style's display name when it is renamed
    pub name_policy: NamePolicy,
    /// Whether to collapse alternate content wrapping content parts
    pub normalize_content_parts: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            keep_sections: true,
            detect_id_collisions: true,
            name_policy: NamePolicy::Synthetic,
            normalize_content_parts: true,
        }
    }
}

impl MergeOptions {
    /// Create a new `MergeOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether each source keeps its own page layout, headers and footers.
    ///
    /// When disabled, only the last source's section properties survive.
    #[inline]
    pub fn with_keep_sections(mut self, keep: bool) -> Self {
        self.keep_sections = keep;
        self
    }

    /// Set whether identifier reuse is treated as a collision.
    ///
    /// Display-name collisions are always detected. Identifier detection
    /// catches styles that were renamed by hand but kept their id.
    #[inline]
    pub fn with_id_collisions(mut self, detect: bool) -> Self {
        self.detect_id_collisions = detect;
        self
    }

    /// Set how display names are handled on rename.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docx_merge::merge::{MergeOptions, NamePolicy};
    ///
    /// let options = MergeOptions::new().with_name_policy(NamePolicy::Preserve);
    /// assert_eq!(options.name_policy, NamePolicy::Preserve);
    /// ```
    #[inline]
    pub fn with_name_policy(mut self, policy: NamePolicy) -> Self {
        self.name_policy = policy;
        self
    }

    #[inline]
    pub fn with_normalize_content_parts(mut self, normalize: bool) -> Self {
        self.normalize_content_parts = normalize;
        self
    }
}

/// Display-name handling for renamed styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// The display name becomes the new identifier.
    ///
    /// Guarantees unique names in the merged styles part at the cost of the
    /// human-readable name.
    #[default]
    Synthetic,

    /// Keep the display name and only disambiguate the identifier.
    Preserve,
}
