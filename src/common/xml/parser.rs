//! Streaming parser that builds an [`XmlDocument`] from raw bytes.
//!
//! Uses quick-xml's event reader and resolves namespace prefixes with a
//! scope stack, so element and attribute names are compared by namespace URI
//! rather than by whatever prefix a producer chose.

use crate::common::xml::arena::{XmlDocument, XmlNode};
use crate::common::xml::xname::{XAttribute, XName, XMLNS_NS};
use crate::common::xml::{Result, XmlError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Stack of in-scope namespace declarations, one frame per open element.
#[derive(Default)]
struct NamespaceScopes {
    frames: Vec<SmallVec<[(Option<String>, String); 4]>>,
}

impl NamespaceScopes {
    fn push(&mut self, frame: SmallVec<[(Option<String>, String); 4]>) {
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(XML_NS),
            Some("xmlns") => return Some(XMLNS_NS),
            _ => {},
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// Parse XML bytes into a mutable tree.
///
/// Whitespace is preserved. Content outside the root element other than the
/// declaration is dropped.
pub fn parse(xml: &[u8]) -> Result<XmlDocument> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut doc = XmlDocument::new();
    let mut scopes = NamespaceScopes::default();
    let mut stack: Vec<indextree::NodeId> = Vec::with_capacity(32);
    let mut buf = Vec::with_capacity(1024);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Decl(_)) => doc.set_declaration(true),
            Ok(Event::Start(ref e)) => {
                let node = open_element(&mut doc, &mut scopes, e, stack.last().copied())?;
                stack.push(node);
            },
            Ok(Event::Empty(ref e)) => {
                open_element(&mut doc, &mut scopes, e, stack.last().copied())?;
                scopes.pop();
            },
            Ok(Event::End(_)) => {
                stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".to_string()))?;
                scopes.pop();
            },
            Ok(Event::Text(ref e)) => {
                if let Some(&parent) = stack.last() {
                    doc.push_text(parent, std::str::from_utf8(e)?);
                }
            },
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(&parent) = stack.last() {
                    let name = std::str::from_utf8(e)?;
                    doc.push_text(parent, &format!("&{};", name));
                }
            },
            Ok(Event::CData(ref e)) => {
                if let Some(&parent) = stack.last() {
                    let content = std::str::from_utf8(e)?.to_string();
                    let node = doc.new_node(XmlNode::CData(content));
                    doc.append(parent, node);
                }
            },
            Ok(Event::Comment(ref e)) => {
                if let Some(&parent) = stack.last() {
                    let content = std::str::from_utf8(e)?.to_string();
                    let node = doc.new_node(XmlNode::Comment(content));
                    doc.append(parent, node);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XmlError::Malformed(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                )));
            },
            _ => {},
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".to_string()));
    }
    if doc.root().is_none() {
        return Err(XmlError::Malformed("document has no root element".to_string()));
    }

    Ok(doc)
}

/// Create the element for a start tag, push its namespace frame and attach it.
fn open_element(
    doc: &mut XmlDocument,
    scopes: &mut NamespaceScopes,
    start: &BytesStart<'_>,
    parent: Option<indextree::NodeId>,
) -> Result<indextree::NodeId> {
    let qname = std::str::from_utf8(start.name().as_ref())?.to_string();

    let mut frame = SmallVec::new();
    let mut raw_attrs: SmallVec<[(String, String); 8]> = SmallVec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        if key == "xmlns" {
            frame.push((None, value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            frame.push((Some(prefix.to_string()), value.clone()));
        }
        raw_attrs.push((key, value));
    }
    scopes.push(frame);

    let (prefix, local) = XName::split_qname(&qname);
    let name = XName::new(scopes.resolve(prefix), prefix, local);

    let attributes = raw_attrs
        .into_iter()
        .map(|(key, value)| {
            let (prefix, local) = XName::split_qname(&key);
            // Unprefixed attributes are in no namespace.
            let namespace = prefix.and_then(|p| scopes.resolve(Some(p)));
            XAttribute::new(XName::new(namespace, prefix, local), value)
        })
        .collect();

    let node = doc.new_node(XmlNode::Element { name, attributes });
    match parent {
        Some(parent) => doc.append(parent, node),
        None if doc.root().is_none() => doc.set_root(node),
        None => {
            return Err(XmlError::Malformed(format!(
                "second root element <{}>",
                qname
            )));
        },
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::xname::{MC_NS, W_NS};

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
  <w:body><mc:AlternateContent><mc:Choice Requires="w14"/></mc:AlternateContent><w:p/></w:body>
</w:document>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert!(doc.has_declaration());
        assert!(doc.is_w(root, "document"));

        let body = doc.find_child(root, W_NS, "body").unwrap();
        let ac = doc.find_child(body, MC_NS, "AlternateContent").unwrap();
        let choice = doc.first_element_child(ac).unwrap();
        assert_eq!(doc.attribute(choice, None, "Requires"), Some("w14"));
    }

    #[test]
    fn test_parse_drops_processing_instructions() {
        let xml = br#"<?xml version="1.0"?><?mso-application progid="Word.Document"?><w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><?pi inside?><w:r/></w:p>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert!(doc.is_w(root, "p"));
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 1);
        assert!(doc.is_w(children[0], "r"));
    }

    #[test]
    fn test_parse_keeps_entities_and_whitespace() {
        let xml = br#"<w:t xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xml:space="preserve"> a &amp; b </w:t>"#;
        let doc = parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.text(root), " a & b ");
        assert_eq!(
            doc.attribute(root, Some(XML_NS), "space"),
            Some("preserve")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"<a/><b/>").is_err());
    }
}
