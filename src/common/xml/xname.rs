//! Namespace-qualified names for elements and attributes.
//!
//! Names keep the prefix they were parsed with so that serialization reproduces
//! the original markup, while comparisons use the resolved namespace URI and the
//! local name only.

use std::fmt;

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Markup compatibility namespace (`mc:AlternateContent` and friends).
pub const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// Office document relationships namespace (`r:id`, `r:embed`, ...).
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// The reserved `xmlns` namespace used for namespace declarations.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// A qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XName {
    /// Resolved namespace URI, if the name is bound to one
    pub namespace: Option<String>,
    /// Prefix as written in the source markup
    pub prefix: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl XName {
    /// Build a name from its namespace, prefix and local part.
    pub fn new(namespace: Option<&str>, prefix: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// A WordprocessingML name using the conventional `w` prefix.
    pub fn w(local: &str) -> Self {
        Self::new(Some(W_NS), Some("w"), local)
    }

    /// Split a raw qualified name (`w:p`) into `(prefix, local)`.
    pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
        match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname),
        }
    }

    /// Check whether this name is `{namespace}local`.
    #[inline]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }

    /// Shorthand for a WordprocessingML name check.
    #[inline]
    pub fn is_w(&self, local: &str) -> bool {
        self.is(W_NS, local)
    }

    /// Whether this attribute name is a namespace declaration.
    #[inline]
    pub fn is_xmlns(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || (self.prefix.is_none() && self.local == "xmlns")
    }

    /// The name as written in markup (`prefix:local`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// An attribute with an unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XAttribute {
    pub name: XName,
    pub value: String,
}

impl XAttribute {
    pub fn new(name: XName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname() {
        assert_eq!(XName::split_qname("w:p"), (Some("w"), "p"));
        assert_eq!(XName::split_qname("body"), (None, "body"));
    }

    #[test]
    fn test_name_matching_ignores_prefix() {
        let name = XName::new(Some(W_NS), Some("ns0"), "pStyle");
        assert!(name.is_w("pStyle"));
        assert!(!name.is(MC_NS, "pStyle"));
        assert_eq!(name.qualified(), "ns0:pStyle");
    }

    #[test]
    fn test_xmlns_detection() {
        assert!(XName::new(None, Some("xmlns"), "w").is_xmlns());
        assert!(XName::new(None, None, "xmlns").is_xmlns());
        assert!(!XName::w("val").is_xmlns());
    }
}
