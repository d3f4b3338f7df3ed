//! Relationship mapping between a source package and the merged output.
//!
//! Content copied out of a source part still carries the source's relationship
//! ids. The mapper imports each referenced target part (recursively, with its
//! own relationships) under a fresh partname and hands back the id of an
//! equivalent relationship on the output part.

use super::ids::{ContentMaps, DocumentIds, remap_content};
use crate::common::xml::{R_NS, XmlDocument, serialize};
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::part::{BlobPart, PartFactory};
use crate::ooxml::opc::{OpcPackage, PackURI};
use indextree::NodeId;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Relationship types that are merged separately or kept from the base document.
const NOT_IMPORTED: [&str; 16] = [
    rt::STYLES,
    rt::NUMBERING,
    rt::SETTINGS,
    rt::WEB_SETTINGS,
    rt::FONT_TABLE,
    rt::THEME,
    rt::STYLES_WITH_EFFECTS,
    rt::GLOSSARY_DOCUMENT,
    rt::CUSTOM_XML,
    rt::FOOTNOTES,
    rt::ENDNOTES,
    rt::COMMENTS,
    rt::COMMENTS_EXTENDED,
    rt::COMMENTS_IDS,
    rt::COMMENTS_EXTENSIBLE,
    rt::PEOPLE,
];

/// Maps relationships of one source package onto the output package.
pub(crate) struct RelationshipMapper<'a> {
    src: &'a OpcPackage,
    /// Source partname to output partname
    parts: HashMap<PackURI, PackURI>,
    /// (source part, source rId) to output rId
    rel_ids: HashMap<(PackURI, String), String>,
    pub(crate) maps: ContentMaps,
    pub(crate) ids: DocumentIds,
}

impl<'a> RelationshipMapper<'a> {
    pub(crate) fn new(src: &'a OpcPackage, ids: DocumentIds) -> Self {
        Self {
            src,
            parts: HashMap::new(),
            rel_ids: HashMap::new(),
            maps: ContentMaps::default(),
            ids,
        }
    }

    /// Give back the document-wide counters.
    pub(crate) fn into_ids(self) -> DocumentIds {
        self.ids
    }

    /// Rewrite every `r:*` attribute under `root` (inclusive) so it points at
    /// a relationship of `out_part`. Returns the number of rewritten values.
    pub(crate) fn remap_relationships(
        &mut self,
        out: &mut OpcPackage,
        doc: &mut XmlDocument,
        root: NodeId,
        src_part: &PackURI,
        out_part: &PackURI,
    ) -> Result<usize> {
        let nodes: Vec<NodeId> = std::iter::once(root).chain(doc.descendants(root)).collect();
        let mut rewritten = 0;
        for node in nodes {
            let references: Vec<(usize, String)> = doc
                .get(node)
                .and_then(|n| n.attributes())
                .map(|attrs| {
                    attrs
                        .iter()
                        .enumerate()
                        .filter(|(_, a)| a.name.namespace.as_deref() == Some(R_NS))
                        .map(|(i, a)| (i, a.value.clone()))
                        .collect()
                })
                .unwrap_or_default();

            for (index, r_id) in references {
                let Some(new_id) = self.map_relationship(out, src_part, out_part, &r_id)? else {
                    continue;
                };
                if let Some(attr) = doc.attributes_mut(node).and_then(|a| a.get_mut(index)) {
                    attr.value = new_id;
                    rewritten += 1;
                }
            }
        }
        Ok(rewritten)
    }

    /// Output rId for relationship `r_id` of `src_part`, creating it on first use.
    fn map_relationship(
        &mut self,
        out: &mut OpcPackage,
        src_part: &PackURI,
        out_part: &PackURI,
        r_id: &str,
    ) -> Result<Option<String>> {
        let key = (src_part.clone(), r_id.to_string());
        if let Some(mapped) = self.rel_ids.get(&key) {
            return Ok(Some(mapped.clone()));
        }

        let src = self.src;
        let Some(rel) = src.get_part(src_part)?.rels().get(r_id) else {
            return Ok(None);
        };
        if NOT_IMPORTED.contains(&rel.reltype()) {
            debug!(r_id, reltype = rel.reltype(), "relationship not imported");
            return Ok(None);
        }

        let new_id = if rel.is_external() {
            out.get_part_mut(out_part)?
                .rels_mut()
                .add_new(rel.reltype(), rel.target_ref(), true)
        } else {
            let target = rel.target_partname()?;
            if !src.contains_part(&target) {
                warn!(r_id, target = %target, "relationship target missing, reference left as is");
                return Ok(None);
            }
            let imported = self.import_part(out, &target)?;
            out.get_part_mut(out_part)?
                .relate_to(&imported, rel.reltype())
        };

        self.rel_ids.insert(key, new_id.clone());
        Ok(Some(new_id))
    }

    /// Copy a source part and everything it relates to into the output.
    pub(crate) fn import_part(&mut self, out: &mut OpcPackage, src_partname: &PackURI) -> Result<PackURI> {
        if let Some(done) = self.parts.get(src_partname) {
            return Ok(done.clone());
        }

        let src = self.src;
        let part = src.get_part(src_partname)?;
        let partname = out.next_partname(&partname_template(src_partname))?;
        // Reserve the name before recursing into related parts.
        out.add_part(Box::new(BlobPart::new(
            partname.clone(),
            part.content_type().to_string(),
            Vec::new(),
        )));
        self.parts.insert(src_partname.clone(), partname.clone());

        let mut rels = Vec::with_capacity(part.rels().len());
        for rel in part.rels().sorted() {
            if rel.is_external() {
                rels.push((rel, rel.target_ref().to_string()));
                continue;
            }
            let target = rel.target_partname()?;
            if !src.contains_part(&target) {
                debug!(target = %target, "skipping dangling relationship");
                continue;
            }
            let imported = self.import_part(out, &target)?;
            rels.push((rel, imported.relative_ref(partname.base_uri())));
        }

        let blob = match part.content_type() {
            ct::WML_HEADER | ct::WML_FOOTER => {
                let mut doc = part.xml()?;
                if let Some(root) = doc.root() {
                    remap_content(&mut doc, root, &self.maps, &mut self.ids);
                }
                serialize(&doc)?
            },
            _ => part.blob().to_vec(),
        };

        let mut imported =
            PartFactory::load(partname.clone(), part.content_type().to_string(), blob)?;
        for (rel, target_ref) in rels {
            imported.rels_mut().add_relationship(
                rel.reltype().to_string(),
                target_ref,
                rel.r_id().to_string(),
                rel.is_external(),
            );
        }
        out.add_part(imported);

        debug!(from = %src_partname, to = %partname, "imported part");
        Ok(partname)
    }
}

/// `/word/media/image%d.png` for `/word/media/image3.png`.
fn partname_template(partname: &PackURI) -> String {
    let filename = partname.filename();
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };
    let stem = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let stem = if stem.is_empty() { "part" } else { stem };
    let dir = match partname.base_uri() {
        "/" => "",
        dir => dir,
    };
    match ext {
        Some(ext) => format!("{}/{}%d.{}", dir, stem, ext),
        None => format!("{}/{}%d", dir, stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse;
    use crate::ooxml::docx::fixture::{DocxFixture, NS};

    #[test]
    fn test_partname_template() {
        let uri = |s: &str| PackURI::new(s).unwrap();
        assert_eq!(partname_template(&uri("/word/media/image12.png")), "/word/media/image%d.png");
        assert_eq!(partname_template(&uri("/word/header1.xml")), "/word/header%d.xml");
        assert_eq!(partname_template(&uri("/word/charts/chart.xml")), "/word/charts/chart%d.xml");
        assert_eq!(partname_template(&uri("/123")), "/part%d");
    }

    #[test]
    fn test_imports_header_with_image() {
        let header_rels = concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rIdImg" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#,
            r#"</Relationships>"#
        );
        let src_bytes = DocxFixture::new("<w:p/>")
            .header(r#"<w:p><w:r><w:drawing/></w:r></w:p>"#)
            .part("rIdImg", "word/media/image1.png", ct::PNG, rt::IMAGE, vec![0x89, b'P', b'N', b'G'])
            .raw("word/_rels/header1.xml.rels", header_rels)
            .build();
        let src = OpcPackage::from_bytes(&src_bytes).unwrap();
        let mut out = OpcPackage::from_bytes(
            &DocxFixture::new("<w:p/>").header("<w:p/>").part(
                "rIdImg",
                "word/media/image1.png",
                ct::PNG,
                rt::IMAGE,
                vec![1, 2, 3],
            ).build(),
        )
        .unwrap();

        let src_main = src.main_partname().unwrap();
        let out_main = out.main_partname().unwrap();
        let mut doc = parse(
            format!(r#"<w:sectPr {}><w:headerReference w:type="default" r:id="rIdH1"/></w:sectPr>"#, NS)
                .as_bytes(),
        )
        .unwrap();
        let root = doc.root().unwrap();

        let mut mapper = RelationshipMapper::new(&src, DocumentIds::default());
        let rewritten = mapper
            .remap_relationships(&mut out, &mut doc, root, &src_main, &out_main)
            .unwrap();
        assert_eq!(rewritten, 1);

        let header_ref = doc.first_element_child(root).unwrap();
        let new_id = doc.attribute(header_ref, Some(R_NS), "id").unwrap();
        let rel = out.main_document_part().unwrap().rels().get(new_id).unwrap();
        assert_eq!(rel.target_ref(), "header2.xml");

        let header = out.get_part(&PackURI::new("/word/header2.xml").unwrap()).unwrap();
        let image_rel = header.rels().get("rIdImg").unwrap();
        assert_eq!(image_rel.target_ref(), "media/image2.png");
        let image = out.get_part(&PackURI::new("/word/media/image2.png").unwrap()).unwrap();
        assert_eq!(image.blob(), &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_external_and_unknown_references() {
        let src_bytes = DocxFixture::new("<w:p/>").build();
        let mut src = OpcPackage::from_bytes(&src_bytes).unwrap();
        let src_main = src.main_partname().unwrap();
        src.get_part_mut(&src_main)
            .unwrap()
            .rels_mut()
            .add_relationship(rt::HYPERLINK.into(), "https://example.com".into(), "rIdLink".into(), true);
        let mut out = OpcPackage::from_bytes(&src_bytes).unwrap();
        let out_main = out.main_partname().unwrap();

        let mut doc = parse(
            format!(
                r#"<w:p {}><w:hyperlink r:id="rIdLink"/><w:hyperlink r:id="rIdLink"/><w:hyperlink r:id="rIdMissing"/></w:p>"#,
                NS
            )
            .as_bytes(),
        )
        .unwrap();
        let root = doc.root().unwrap();
        let mut mapper = RelationshipMapper::new(&src, DocumentIds::default());
        assert_eq!(
            mapper
                .remap_relationships(&mut out, &mut doc, root, &src_main, &out_main)
                .unwrap(),
            2
        );

        let ids: Vec<&str> = doc
            .elements(root)
            .filter_map(|n| doc.attribute(n, Some(R_NS), "id"))
            .collect();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], "rIdMissing");
        let main = out.main_document_part().unwrap();
        assert!(main.rels().get(ids[0]).unwrap().is_external());
        assert_eq!(main.rels().len(), 1);
    }
}
