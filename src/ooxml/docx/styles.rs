//! Style collision resolution across merged documents.
//!
//! Each document's style definitions are checked, in declaration order,
//! against a [`StyleRegistry`] of everything seen in earlier documents.
//! Colliding styles get a new identifier and every reference to the old
//! identifier inside that document is rewritten to follow.

use crate::common::xml::{W_NS, XName, XmlDocument};
use crate::merge::{MergeOptions, NamePolicy};
use crate::ooxml::docx::package::WordPackage;
use crate::ooxml::docx::references::update_style_references;
use crate::ooxml::error::Result;
use crate::ooxml::opc::PackURI;
use indextree::NodeId;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

/// Style names and identifiers seen so far in a merge run.
///
/// Entries are only ever added. The registry is created empty per merge and
/// threaded through the documents in merge order.
#[derive(Debug, Default, Clone)]
pub struct StyleRegistry {
    names: HashSet<String>,
    ids: HashSet<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[inline]
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record a style's current display name and identifier.
    pub fn insert(&mut self, name: Option<&str>, id: Option<&str>) {
        if let Some(name) = name {
            self.names.insert(name.to_string());
        }
        if let Some(id) = id {
            self.ids.insert(id.to_string());
        }
    }

    /// Number of distinct display names recorded.
    pub fn name_count(&self) -> usize {
        self.names.len()
    }
}

/// One renamed style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRename {
    pub old_id: String,
    pub new_id: String,
    pub old_name: Option<String>,
}

/// Outcome of resolving one document.
#[derive(Debug, Default, Clone)]
pub struct ResolveReport {
    pub renames: Vec<StyleRename>,
    /// References rewritten across the body, headers, footers, notes,
    /// comments, numbering and styles
    pub references: usize,
}

impl ResolveReport {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Detects and renames colliding style definitions.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver {
    detect_id_collisions: bool,
    name_policy: NamePolicy,
}

impl StyleResolver {
    pub fn new(options: &MergeOptions) -> Self {
        Self {
            detect_id_collisions: options.detect_id_collisions,
            name_policy: options.name_policy,
        }
    }

    /// Resolve the styles of the document at position `index` in merge order.
    ///
    /// A document without a styles part is left untouched. Parts are only
    /// written back when at least one style was renamed.
    pub fn resolve(
        &self,
        pkg: &mut WordPackage,
        index: usize,
        registry: &mut StyleRegistry,
    ) -> Result<ResolveReport> {
        let mut report = ResolveReport::default();
        let Some(styles_partname) = pkg.styles_partname()? else {
            return Ok(report);
        };
        let mut styles = pkg.load_xml(&styles_partname)?;
        let Some(styles_root) = styles.root() else {
            return Ok(report);
        };

        let definitions = styles.find_children(styles_root, W_NS, "style");
        let mut used_ids: HashSet<String> = definitions
            .iter()
            .filter_map(|&style| styles.attribute(style, Some(W_NS), "styleId"))
            .map(str::to_string)
            .collect();
        let mut targets: Option<ReferenceTargets> = None;

        for style in definitions {
            let id = styles
                .attribute(style, Some(W_NS), "styleId")
                .map(str::to_string);
            let name_node = styles.find_child(style, W_NS, "name");
            let name = name_node
                .and_then(|n| styles.w_val(n))
                .map(str::to_string);

            let Some(old_id) = id else {
                registry.insert(name.as_deref(), None);
                continue;
            };

            let colliding = name.as_deref().is_some_and(|n| registry.contains_name(n))
                || (self.detect_id_collisions && registry.contains_id(&old_id));
            if !colliding {
                registry.insert(name.as_deref(), Some(&old_id));
                continue;
            }

            let new_id = unique_style_id(index, &old_id, &used_ids, registry);
            used_ids.insert(new_id.clone());
            styles.set_attribute(style, XName::w("styleId"), new_id.as_str());

            let current_name = match (self.name_policy, name_node) {
                (NamePolicy::Synthetic, Some(name_node)) => {
                    styles.set_attribute(name_node, XName::w("val"), new_id.as_str());
                    Some(new_id.clone())
                },
                _ => name.clone(),
            };

            if targets.is_none() {
                targets = Some(ReferenceTargets::load(pkg)?);
            }
            let rewritten = rewrite_style_links(&mut styles, styles_root, &old_id, &new_id)
                + targets
                    .as_mut()
                    .map_or(0, |targets| targets.update(&old_id, &new_id));
            report.references += rewritten;

            debug!(
                document = index,
                old_id = %old_id,
                new_id = %new_id,
                references = rewritten,
                "renamed colliding style"
            );
            registry.insert(current_name.as_deref(), Some(&new_id));
            report.renames.push(StyleRename {
                old_id,
                new_id,
                old_name: name,
            });
        }

        if let Some(targets) = targets {
            pkg.store_xml(&styles_partname, &styles)?;
            targets.store(pkg)?;
        }
        Ok(report)
    }
}

/// Derive `<old>-<5 hex>` from the document index, the old identifier and an
/// attempt counter, skipping candidates already taken.
fn unique_style_id(
    index: usize,
    old_id: &str,
    used_ids: &HashSet<String>,
    registry: &StyleRegistry,
) -> String {
    let mut attempt: u64 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update((index as u64).to_le_bytes());
        hasher.update(old_id.as_bytes());
        hasher.update(attempt.to_le_bytes());
        let digest = hasher.finalize();

        let mut suffix: String = digest.iter().take(3).map(|b| format!("{:02x}", b)).collect();
        suffix.truncate(5);
        let candidate = format!("{}-{}", old_id, suffix);
        if !used_ids.contains(&candidate) && !registry.contains_id(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Rewrite `w:basedOn`, `w:next` and `w:link` of every style definition.
fn rewrite_style_links(doc: &mut XmlDocument, root: NodeId, old: &str, new: &str) -> usize {
    let links: Vec<NodeId> = doc
        .find_children(root, W_NS, "style")
        .into_iter()
        .flat_map(|style| {
            ["basedOn", "next", "link"]
                .into_iter()
                .filter_map(|local| doc.find_child(style, W_NS, local))
                .collect::<Vec<_>>()
        })
        .collect();
    set_matching_vals(doc, links, old, new)
}

/// Rewrite numbering level paragraph styles and abstract numbering style links.
fn rewrite_numbering(doc: &mut XmlDocument, root: NodeId, old: &str, new: &str) -> usize {
    let mut nodes = Vec::new();
    for abstract_num in doc.find_children(root, W_NS, "abstractNum") {
        for local in ["styleLink", "numStyleLink"] {
            nodes.extend(doc.find_child(abstract_num, W_NS, local));
        }
        for lvl in doc.find_children(abstract_num, W_NS, "lvl") {
            if let Some(ppr) = doc.find_child(lvl, W_NS, "pPr") {
                nodes.extend(doc.find_child(ppr, W_NS, "pStyle"));
            }
        }
    }
    set_matching_vals(doc, nodes, old, new) + update_style_references(doc, root, old, new)
}

fn set_matching_vals(doc: &mut XmlDocument, nodes: Vec<NodeId>, old: &str, new: &str) -> usize {
    let mut rewritten = 0;
    for node in nodes {
        if doc.w_val(node) == Some(old) {
            doc.set_attribute(node, XName::w("val"), new);
            rewritten += 1;
        }
    }
    rewritten
}

/// Parsed parts whose style references follow a rename.
struct ReferenceTargets {
    body: (PackURI, XmlDocument),
    /// Headers, footers, footnotes, endnotes and comments
    stories: Vec<(PackURI, XmlDocument)>,
    numbering: Option<(PackURI, XmlDocument)>,
}

impl ReferenceTargets {
    fn load(pkg: &WordPackage) -> Result<Self> {
        let load = |partname: PackURI| -> Result<(PackURI, XmlDocument)> {
            let doc = pkg.load_xml(&partname)?;
            Ok((partname, doc))
        };

        let stories = pkg
            .header_partnames()?
            .into_iter()
            .chain(pkg.footer_partnames()?)
            .chain(pkg.annotation_partnames()?)
            .map(load)
            .collect::<Result<_>>()?;
        Ok(Self {
            body: load(pkg.main_partname().clone())?,
            stories,
            numbering: pkg.numbering_partname()?.map(load).transpose()?,
        })
    }

    fn update(&mut self, old: &str, new: &str) -> usize {
        let mut rewritten = 0;
        for (_, doc) in std::iter::once(&mut self.body).chain(self.stories.iter_mut()) {
            if let Some(root) = doc.root() {
                rewritten += update_style_references(doc, root, old, new);
            }
        }
        if let Some((_, doc)) = self.numbering.as_mut()
            && let Some(root) = doc.root()
        {
            rewritten += rewrite_numbering(doc, root, old, new);
        }
        rewritten
    }

    fn store(self, pkg: &mut WordPackage) -> Result<()> {
        for (partname, doc) in std::iter::once(self.body)
            .chain(self.stories)
            .chain(self.numbering)
        {
            pkg.store_xml(&partname, &doc)?;
        }
        Ok(())
    }
}
