//! Relationships between a package source and its targets.
//!
//! A source (the package itself or one of its parts) points at other parts,
//! or at external resources, through relationship ids that its XML refers to.
//! Ids are only unique within one source.

use crate::common::xml::{XmlDocument, escape_xml, parse};
use crate::ooxml::opc::constants::{namespace, target_mode};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use std::cmp::Ordering;
use std::fmt::Write;

/// Whether a relationship target lives inside the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

impl TargetMode {
    /// Parse a `TargetMode` attribute value; anything but `External` is internal.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(target_mode::EXTERNAL) => TargetMode::External,
            _ => TargetMode::Internal,
        }
    }
}

/// A single relationship from a source to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    r_id: String,
    reltype: String,
    /// Relative part reference, or a URL for external targets
    target_ref: String,
    mode: TargetMode,
    /// Base URI of the source, for resolving `target_ref`
    base_uri: String,
}

impl Relationship {
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.mode == TargetMode::External
    }

    /// Absolute partname of an internal target.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external() {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Order `rId2` before `rId10`; ids without a numeric suffix sort last.
fn cmp_r_ids(a: &str, b: &str) -> Ordering {
    let number = |r_id: &str| {
        r_id.strip_prefix("rId")
            .and_then(|digits| atoi_simd::parse::<u64, false, false>(digits.as_bytes()).ok())
    };
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Relationships of one source, in the order they were read or added.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: Vec<Relationship>,
}

impl Relationships {
    /// An empty collection for a source whose base URI is `base_uri`.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: Vec::new(),
        }
    }

    /// Read the content of a `.rels` part.
    ///
    /// Entries missing an id, type or target are ignored.
    pub fn from_xml(xml: &[u8], base_uri: &str) -> Result<Self> {
        let doc: XmlDocument = parse(xml)?;
        let mut rels = Self::new(base_uri.to_string());
        let Some(root) = doc.root() else {
            return Ok(rels);
        };
        for node in doc.elements(root) {
            if doc.name(node).is_none_or(|n| n.local != "Relationship") {
                continue;
            }
            let (Some(r_id), Some(reltype), Some(target_ref)) = (
                doc.attribute(node, None, "Id"),
                doc.attribute(node, None, "Type"),
                doc.attribute(node, None, "Target"),
            ) else {
                continue;
            };
            let mode = TargetMode::from_attr(doc.attribute(node, None, "TargetMode"));
            rels.add_relationship(
                reltype.to_string(),
                target_ref.to_string(),
                r_id.to_string(),
                mode == TargetMode::External,
            );
        }
        Ok(rels)
    }

    /// Add a relationship under a known id, replacing one that already uses it.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship {
            r_id,
            reltype,
            target_ref,
            mode: if is_external {
                TargetMode::External
            } else {
                TargetMode::Internal
            },
            base_uri: self.base_uri.clone(),
        };
        let index = match self.rels.iter().position(|r| r.r_id == rel.r_id) {
            Some(index) => {
                self.rels[index] = rel;
                index
            },
            None => {
                self.rels.push(rel);
                self.rels.len() - 1
            },
        };
        &self.rels[index]
    }

    /// Add a relationship under the lowest unused `rIdN` and return that id.
    pub fn add_new(&mut self, reltype: &str, target_ref: &str, is_external: bool) -> String {
        let r_id = self.next_r_id();
        self.add_relationship(
            reltype.to_string(),
            target_ref.to_string(),
            r_id.clone(),
            is_external,
        );
        r_id
    }

    /// The id of an internal relationship to `target_ref`, adding one if needed.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        match self
            .rels
            .iter()
            .find(|r| !r.is_external() && r.reltype == reltype && r.target_ref == target_ref)
        {
            Some(rel) => rel.r_id.clone(),
            None => self.add_new(reltype, target_ref, false),
        }
    }

    fn next_r_id(&self) -> String {
        let mut n = 1u64;
        loop {
            let candidate = format!("rId{}", n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.r_id == r_id)
    }

    /// The only relationship of a type; none or several is an error.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.iter().filter(|r| r.reltype == reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::RelationshipNotFound(reltype.to_string())),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "several relationships of type {}",
                reltype
            ))),
        }
    }

    /// Relationships of a type, in rId order.
    pub fn all_with_reltype(&self, reltype: &str) -> Vec<&Relationship> {
        let mut matching: Vec<&Relationship> =
            self.rels.iter().filter(|r| r.reltype == reltype).collect();
        matching.sort_by(|a, b| cmp_r_ids(&a.r_id, &b.r_id));
        matching
    }

    /// Every relationship in rId order.
    pub fn sorted(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.rels.iter().collect();
        rels.sort_by(|a, b| cmp_r_ids(&a.r_id, &b.r_id));
        rels
    }

    /// Relationships in document order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Content of the `.rels` part, entries in document order.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(160 * (self.rels.len() + 1));
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
        let _ = write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS);
        for rel in &self.rels {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_xml(&rel.r_id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target_ref),
            );
            if rel.is_external() {
                let _ = write!(xml, r#" TargetMode="{}""#, target_mode::EXTERNAL);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r_id_order_is_numeric() {
        assert_eq!(cmp_r_ids("rId2", "rId10"), Ordering::Less);
        assert_eq!(cmp_r_ids("rId10", "rIdStyles"), Ordering::Less);

        let mut rels = Relationships::new("/word".to_string());
        rels.add_relationship("t".into(), "b.xml".into(), "rId10".into(), false);
        rels.add_relationship("t".into(), "a.xml".into(), "rId2".into(), false);
        let order: Vec<&str> = rels.sorted().iter().map(|r| r.r_id()).collect();
        assert_eq!(order, vec!["rId2", "rId10"]);
        // Document order is kept for serialization.
        assert!(rels.to_xml().find("rId10") < rels.to_xml().find("rId2"));
    }

    #[test]
    fn test_add_new_fills_gaps_and_get_or_add_reuses() {
        let mut rels = Relationships::new("/word".to_string());
        rels.add_relationship("t".into(), "a.xml".into(), "rId1".into(), false);
        rels.add_relationship("t".into(), "c.xml".into(), "rId3".into(), false);
        assert_eq!(rels.add_new("t", "b.xml", false), "rId2");
        assert_eq!(rels.get_or_add("t", "c.xml"), "rId3");
        assert_eq!(rels.get_or_add("t", "d.xml"), "rId4");
    }

    #[test]
    fn test_from_xml_round_trip() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="t/styles" Target="styles.xml"/>
            <Relationship Id="rId2" Type="t/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
            <Relationship Id="rId3" Type="t/broken"/>
        </Relationships>"#;
        let rels = Relationships::from_xml(xml, "/word").unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(
            rels.get("rId1").unwrap().target_partname().unwrap().as_str(),
            "/word/styles.xml"
        );
        let link = rels.get("rId2").unwrap();
        assert!(link.is_external());
        assert_eq!(link.target_ref(), "https://example.com/?a=1&b=2");
        assert!(link.target_partname().is_err());

        let again = Relationships::from_xml(rels.to_xml().as_bytes(), "/word").unwrap();
        assert_eq!(again.get("rId2").unwrap().target_ref(), link.target_ref());
    }

    #[test]
    fn test_part_with_reltype() {
        let mut rels = Relationships::default();
        assert!(rels.part_with_reltype("styles").is_err());
        rels.add_new("header", "header1.xml", false);
        rels.add_new("header", "header2.xml", false);
        assert!(rels.part_with_reltype("header").is_err());
        assert_eq!(rels.all_with_reltype("header").len(), 2);
    }
}
