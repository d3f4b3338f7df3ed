//! Serializer that writes an [`XmlDocument`] back to bytes.

use crate::common::xml::arena::{XmlDocument, XmlNode};
use crate::common::xml::{Result, XmlError};
use indextree::NodeId;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Serialize a document.
///
/// Elements without children are written as empty tags. Documents parsed with
/// a declaration get the standalone OOXML declaration back.
pub fn serialize(doc: &XmlDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::with_capacity(8192));

    if doc.has_declaration() {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| XmlError::Write(e.to_string()))?;
        writer.get_mut().extend_from_slice(b"\r\n");
    }

    if let Some(root) = doc.root() {
        write_node(doc, root, &mut writer)?;
    }

    Ok(writer.into_inner())
}

fn write_node(doc: &XmlDocument, node: NodeId, writer: &mut Writer<Vec<u8>>) -> Result<()> {
    let event = match doc.get(node) {
        Some(XmlNode::Element { name, attributes }) => {
            let qname = name.qualified();
            let mut start = BytesStart::new(qname.as_str());
            for attr in attributes {
                let key = attr.name.qualified();
                start.push_attribute((key.as_str(), attr.value.as_str()));
            }

            if !doc.has_children(node) {
                return writer
                    .write_event(Event::Empty(start))
                    .map_err(|e| XmlError::Write(e.to_string()));
            }

            writer
                .write_event(Event::Start(start))
                .map_err(|e| XmlError::Write(e.to_string()))?;
            for child in doc.children(node) {
                write_node(doc, child, writer)?;
            }
            return writer
                .write_event(Event::End(BytesEnd::new(qname.as_str())))
                .map_err(|e| XmlError::Write(e.to_string()));
        },
        Some(XmlNode::Text(raw)) => Event::Text(BytesText::from_escaped(raw.as_str())),
        Some(XmlNode::CData(raw)) => Event::CData(BytesCData::new(raw.as_str())),
        Some(XmlNode::Comment(raw)) => Event::Comment(BytesText::from_escaped(raw.as_str())),
        None => return Ok(()),
    };

    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}
