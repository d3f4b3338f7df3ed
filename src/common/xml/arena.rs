//! Arena-backed mutable XML tree.
//!
//! Nodes live in an `indextree` arena, so every node knows its parent and
//! ancestor lookups are a single upward walk. Element names carry their
//! resolved namespace; text is kept in its escaped form so that serialization
//! reproduces entity references exactly.

use crate::common::xml::escape::unescape_xml;
use crate::common::xml::xname::{XAttribute, XName, W_NS};
use indextree::{Arena, NodeId};

/// A single node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// An element with its attributes in document order
    Element {
        name: XName,
        attributes: Vec<XAttribute>,
    },
    /// Character data in escaped form
    Text(String),
    /// Raw CDATA content
    CData(String),
    /// Comment content
    Comment(String),
}

impl XmlNode {
    /// Element name, or `None` for non-element nodes.
    #[inline]
    pub fn name(&self) -> Option<&XName> {
        match self {
            XmlNode::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element attributes, or `None` for non-element nodes.
    #[inline]
    pub fn attributes(&self) -> Option<&[XAttribute]> {
        match self {
            XmlNode::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, XmlNode::Element { .. })
    }
}

/// A parsed XML part.
#[derive(Debug, Default)]
pub struct XmlDocument {
    arena: Arena<XmlNode>,
    root: Option<NodeId>,
    declaration: bool,
}

impl XmlDocument {
    /// Create an empty document without a root element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document whose root element is `name`.
    pub fn with_root(name: XName) -> Self {
        let mut doc = Self::new();
        let root = doc.new_element(name);
        doc.root = Some(root);
        doc.declaration = true;
        doc
    }

    /// The root element.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Whether the source carried an XML declaration.
    #[inline]
    pub fn has_declaration(&self) -> bool {
        self.declaration
    }

    pub(crate) fn set_declaration(&mut self, declaration: bool) {
        self.declaration = declaration;
    }

    /// Get the data stored at a node.
    #[inline]
    pub fn get(&self, node: NodeId) -> Option<&XmlNode> {
        self.arena.get(node).map(|n| n.get())
    }

    /// Element name of a node.
    #[inline]
    pub fn name(&self, node: NodeId) -> Option<&XName> {
        self.get(node).and_then(XmlNode::name)
    }

    /// Whether `node` is the element `{namespace}local`.
    #[inline]
    pub fn is(&self, node: NodeId, namespace: &str, local: &str) -> bool {
        self.name(node).is_some_and(|n| n.is(namespace, local))
    }

    /// Whether `node` is the WordprocessingML element `w:local`.
    #[inline]
    pub fn is_w(&self, node: NodeId, local: &str) -> bool {
        self.is(node, W_NS, local)
    }

    #[inline]
    pub fn is_element(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(XmlNode::is_element)
    }

    /// Whether the node has been removed from the tree.
    #[inline]
    pub fn is_removed(&self, node: NodeId) -> bool {
        node.is_removed(&self.arena)
    }

    /// Parent of a node.
    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|n| n.parent())
    }

    /// All child nodes, including text.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.arena)
    }

    /// Element children only.
    pub fn elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.children(&self.arena).filter(move |&c| self.is_element(c))
    }

    /// Whether the node has any child nodes.
    #[inline]
    pub fn has_children(&self, node: NodeId) -> bool {
        self.arena.get(node).is_some_and(|n| n.first_child().is_some())
    }

    /// First element child.
    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.elements(node).next()
    }

    /// All descendants in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena).skip(1)
    }

    /// Ancestors from the parent upwards, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena).skip(1)
    }

    /// First element child named `{namespace}local`.
    pub fn find_child(&self, node: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.elements(node).find(|&c| self.is(c, namespace, local))
    }

    /// All element children named `{namespace}local`.
    pub fn find_children(&self, node: NodeId, namespace: &str, local: &str) -> Vec<NodeId> {
        self.elements(node)
            .filter(|&c| self.is(c, namespace, local))
            .collect()
    }

    /// All descendant elements named `{namespace}local`, in document order.
    pub fn find_descendants(&self, node: NodeId, namespace: &str, local: &str) -> Vec<NodeId> {
        self.descendants(node)
            .filter(|&c| self.is(c, namespace, local))
            .collect()
    }

    /// Nearest ancestor element named `{namespace}local`.
    pub fn find_ancestor(&self, node: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.ancestors(node).find(|&a| self.is(a, namespace, local))
    }

    /// Get an attribute value by namespace and local name.
    ///
    /// Pass `None` as namespace for unprefixed attributes.
    pub fn attribute(&self, node: NodeId, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.get(node)?
            .attributes()?
            .iter()
            .find(|a| a.name.local == local && a.name.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    /// Shorthand for the ubiquitous `w:val` attribute.
    #[inline]
    pub fn w_val(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, Some(W_NS), "val")
    }

    /// Set an attribute, replacing an existing one with the same namespace and local name.
    pub fn set_attribute(&mut self, node: NodeId, name: XName, value: impl Into<String>) {
        let value = value.into();
        if let Some(XmlNode::Element { attributes, .. }) =
            self.arena.get_mut(node).map(|n| n.get_mut())
        {
            match attributes
                .iter_mut()
                .find(|a| a.name.local == name.local && a.name.namespace == name.namespace)
            {
                Some(existing) => existing.value = value,
                None => attributes.push(XAttribute::new(name, value)),
            }
        }
    }

    /// Drop an attribute; returns whether it was present.
    pub fn remove_attribute(&mut self, node: NodeId, namespace: Option<&str>, local: &str) -> bool {
        let Some(attributes) = self.attributes_mut(node) else {
            return false;
        };
        let before = attributes.len();
        attributes.retain(|a| !(a.name.local == local && a.name.namespace.as_deref() == namespace));
        attributes.len() != before
    }

    /// Mutable access to an element's attribute list.
    pub fn attributes_mut(&mut self, node: NodeId) -> Option<&mut Vec<XAttribute>> {
        match self.arena.get_mut(node).map(|n| n.get_mut()) {
            Some(XmlNode::Element { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    /// Create a detached element node.
    pub fn new_element(&mut self, name: XName) -> NodeId {
        self.arena.new_node(XmlNode::Element {
            name,
            attributes: Vec::new(),
        })
    }

    /// Create a detached node of any kind.
    pub fn new_node(&mut self, data: XmlNode) -> NodeId {
        self.arena.new_node(data)
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Insert `new` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        sibling.insert_before(new, &mut self.arena);
    }

    /// Insert `new` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, new: NodeId) {
        sibling.insert_after(new, &mut self.arena);
    }

    /// Detach a subtree from its parent while keeping it usable.
    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    /// Append escaped text to `parent`, merging with a trailing text node.
    pub(crate) fn push_text(&mut self, parent: NodeId, raw: &str) {
        if let Some(last) = self.arena.get(parent).and_then(|n| n.last_child())
            && let XmlNode::Text(existing) = self.arena[last].get_mut()
        {
            existing.push_str(raw);
            return;
        }
        let text = self.arena.new_node(XmlNode::Text(raw.to_string()));
        parent.append(text, &mut self.arena);
    }

    /// Deep-copy a subtree within this document. The copy is detached.
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let data = self.arena[node].get().clone();
        let copy = self.arena.new_node(data);
        let children: Vec<NodeId> = node.children(&self.arena).collect();
        for child in children {
            let child_copy = self.deep_clone(child);
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }

    /// Deep-copy a subtree of another document into this one. The copy is detached.
    pub fn import(&mut self, src: &XmlDocument, node: NodeId) -> NodeId {
        let data = src.arena[node].get().clone();
        let copy = self.arena.new_node(data);
        for child in src.children(node) {
            let child_copy = self.import(src, child);
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }

    /// Concatenated, unescaped text content of a subtree.
    pub fn text(&self, node: NodeId) -> String {
        let mut raw = String::new();
        for id in node.descendants(&self.arena) {
            if let XmlNode::Text(t) | XmlNode::CData(t) = self.arena[id].get() {
                raw.push_str(t);
            }
        }
        unescape_xml(&raw)
    }
}
