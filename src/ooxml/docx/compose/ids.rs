//! Renumbering of document-scoped numeric identifiers.
//!
//! Numbering instances, notes, comments, bookmarks and drawing objects are
//! identified by integers that only have to be unique within one document.
//! Content copied from another document gets fresh values, tracked here.

use crate::common::xml::{W_NS, XName, XmlDocument};
use indextree::NodeId;
use std::collections::HashMap;

/// WordprocessingDrawing namespace, home of `wp:docPr`.
pub(crate) const WP_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

/// Old-to-new mapping for one kind of identifier, with a running counter.
#[derive(Debug, Default, Clone)]
pub(crate) struct IdMap {
    next: i64,
    map: HashMap<String, String>,
}

impl IdMap {
    /// Fresh values start right after `max`.
    pub(crate) fn starting_after(max: i64) -> Self {
        Self {
            next: max + 1,
            map: HashMap::new(),
        }
    }

    /// Hand out the next unused value.
    pub(crate) fn fresh(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        itoa::Buffer::new().format(id).to_string()
    }

    /// The new value for `old`, assigning one on first sight.
    pub(crate) fn assign(&mut self, old: &str) -> String {
        if let Some(new) = self.map.get(old) {
            return new.clone();
        }
        let new = self.fresh();
        self.map.insert(old.to_string(), new.clone());
        new
    }

    pub(crate) fn get(&self, old: &str) -> Option<&str> {
        self.map.get(old).map(String::as_str)
    }

    /// Forget the mapping but keep counting, so the next source cannot reuse values.
    pub(crate) fn clear_mapping(&mut self) {
        self.map.clear();
    }
}

/// Identifiers that must be unique across the whole output document.
#[derive(Debug, Default)]
pub(crate) struct DocumentIds {
    pub(crate) bookmarks: IdMap,
    pub(crate) drawings: IdMap,
}

impl DocumentIds {
    /// Seed counters from every tree already in the output.
    pub(crate) fn scan<'a>(docs: impl IntoIterator<Item = &'a XmlDocument>) -> Self {
        let mut max_bookmark = -1;
        let mut max_drawing = 0;
        for doc in docs {
            let Some(root) = doc.root() else { continue };
            max_bookmark = max_bookmark.max(max_attribute(doc, root, W_NS, "bookmarkStart", Some(W_NS), "id"));
            max_drawing = max_drawing.max(max_attribute(doc, root, WP_NS, "docPr", None, "id"));
        }
        Self {
            bookmarks: IdMap::starting_after(max_bookmark),
            drawings: IdMap::starting_after(max_drawing),
        }
    }

    pub(crate) fn begin_source(&mut self) {
        self.bookmarks.clear_mapping();
        self.drawings.clear_mapping();
    }
}

/// Per-source mappings filled while merging numbering, notes and comments.
#[derive(Debug, Default)]
pub(crate) struct ContentMaps {
    pub(crate) num_ids: IdMap,
    pub(crate) footnotes: IdMap,
    pub(crate) endnotes: IdMap,
    pub(crate) comments: IdMap,
    /// Source default paragraph style, when the output's default differs
    pub(crate) default_paragraph_style: Option<String>,
    /// Source default table style, when the output's default differs
    pub(crate) default_table_style: Option<String>,
}

/// Largest integer value of `attr` on descendants named `{ns}local`, or -1.
pub(crate) fn max_attribute(
    doc: &XmlDocument,
    root: NodeId,
    ns: &str,
    local: &str,
    attr_ns: Option<&str>,
    attr: &str,
) -> i64 {
    std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|&n| doc.is(n, ns, local))
        .filter_map(|n| doc.attribute(n, attr_ns, attr))
        .filter_map(|v| atoi_simd::parse::<i64, false, false>(v.as_bytes()).ok())
        .max()
        .unwrap_or(-1)
}

/// Rewrite identifier references in a freshly imported subtree.
pub(crate) fn remap_content(
    doc: &mut XmlDocument,
    root: NodeId,
    maps: &ContentMaps,
    ids: &mut DocumentIds,
) {
    let nodes: Vec<NodeId> = std::iter::once(root).chain(doc.descendants(root)).collect();
    for node in nodes {
        let Some(name) = doc.name(node) else { continue };
        let in_w = name.namespace.as_deref() == Some(W_NS);
        let in_wp = name.namespace.as_deref() == Some(WP_NS);
        let local = name.local.clone();
        match local.as_str() {
            "numId" if in_w => map_attr(doc, node, Some(W_NS), "val", &maps.num_ids),
            "footnoteReference" if in_w => map_attr(doc, node, Some(W_NS), "id", &maps.footnotes),
            "endnoteReference" if in_w => map_attr(doc, node, Some(W_NS), "id", &maps.endnotes),
            "commentRangeStart" | "commentRangeEnd" | "commentReference" if in_w => {
                map_attr(doc, node, Some(W_NS), "id", &maps.comments)
            },
            "bookmarkStart" | "bookmarkEnd" if in_w => {
                if let Some(old) = doc.attribute(node, Some(W_NS), "id").map(str::to_string) {
                    let new = ids.bookmarks.assign(&old);
                    doc.set_attribute(node, XName::w("id"), new);
                }
            },
            "p" if in_w => {
                if let Some(style) = maps.default_paragraph_style.as_deref() {
                    ensure_style(doc, node, "pPr", "pStyle", style);
                }
            },
            "tbl" if in_w => {
                if let Some(style) = maps.default_table_style.as_deref() {
                    ensure_style(doc, node, "tblPr", "tblStyle", style);
                }
            },
            "docPr" if in_wp => {
                if doc.attribute(node, None, "id").is_some() {
                    let new = ids.drawings.fresh();
                    doc.set_attribute(node, XName::new(None, None, "id"), new);
                }
            },
            _ => {},
        }
    }
}

/// Give `owner` an explicit `props/style` reference unless it already has one.
///
/// Both the property element and the style reference go first among their
/// siblings, as the schema orders them.
fn ensure_style(doc: &mut XmlDocument, owner: NodeId, props: &str, style: &str, value: &str) {
    let prefix = doc.name(owner).and_then(|n| n.prefix.clone());
    let w_name = |local: &str| XName::new(Some(W_NS), prefix.as_deref(), local);

    let props_node = match doc.find_child(owner, W_NS, props) {
        Some(node) => node,
        None => {
            let node = doc.new_element(w_name(props));
            prepend(doc, owner, node);
            node
        },
    };
    if doc.find_child(props_node, W_NS, style).is_some() {
        return;
    }
    let reference = doc.new_element(w_name(style));
    doc.set_attribute(reference, w_name("val"), value);
    prepend(doc, props_node, reference);
}

fn prepend(doc: &mut XmlDocument, parent: NodeId, node: NodeId) {
    let first = doc.children(parent).next();
    match first {
        Some(first) => doc.insert_before(first, node),
        None => doc.append(parent, node),
    }
}

fn map_attr(doc: &mut XmlDocument, node: NodeId, ns: Option<&str>, local: &str, map: &IdMap) {
    let Some(new) = doc
        .attribute(node, ns, local)
        .and_then(|old| map.get(old))
        .map(str::to_string)
    else {
        return;
    };
    doc.set_attribute(node, XName::new(ns, Some("w"), local), new);
}
