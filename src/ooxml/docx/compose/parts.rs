//! Merging of the document-wide parts: styles, numbering, notes and comments.
//!
//! The base document's parts are loaded once and extended with the
//! definitions of every later source. A part the base lacks is created on
//! first use, related from the main document.

use super::ids::{IdMap, max_attribute, remap_content};
use super::relmap::RelationshipMapper;
use crate::common::xml::{MC_NS, W_NS, XName, XmlDocument};
use crate::ooxml::docx::package::WordPackage;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::part::XmlPart;
use crate::ooxml::opc::{OpcPackage, PackURI};
use indextree::NodeId;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Document-wide parts extended during composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum AuxKind {
    Styles,
    Numbering,
    Footnotes,
    Endnotes,
    Comments,
}

impl AuxKind {
    const ALL: [AuxKind; 5] = [
        AuxKind::Styles,
        AuxKind::Numbering,
        AuxKind::Footnotes,
        AuxKind::Endnotes,
        AuxKind::Comments,
    ];

    fn reltype(self) -> &'static str {
        match self {
            AuxKind::Styles => rt::STYLES,
            AuxKind::Numbering => rt::NUMBERING,
            AuxKind::Footnotes => rt::FOOTNOTES,
            AuxKind::Endnotes => rt::ENDNOTES,
            AuxKind::Comments => rt::COMMENTS,
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            AuxKind::Styles => ct::WML_STYLES,
            AuxKind::Numbering => ct::WML_NUMBERING,
            AuxKind::Footnotes => ct::WML_FOOTNOTES,
            AuxKind::Endnotes => ct::WML_ENDNOTES,
            AuxKind::Comments => ct::WML_COMMENTS,
        }
    }

    fn partname_template(self) -> &'static str {
        match self {
            AuxKind::Styles => "/word/styles%d.xml",
            AuxKind::Numbering => "/word/numbering%d.xml",
            AuxKind::Footnotes => "/word/footnotes%d.xml",
            AuxKind::Endnotes => "/word/endnotes%d.xml",
            AuxKind::Comments => "/word/comments%d.xml",
        }
    }

    /// Child element holding one note or comment.
    fn item_local(self) -> &'static str {
        match self {
            AuxKind::Styles => "style",
            AuxKind::Numbering => "num",
            AuxKind::Footnotes => "footnote",
            AuxKind::Endnotes => "endnote",
            AuxKind::Comments => "comment",
        }
    }
}

/// A part parsed for editing.
#[derive(Debug)]
pub(crate) struct LoadedPart {
    pub(crate) partname: PackURI,
    pub(crate) doc: XmlDocument,
}

/// The output's document-wide parts, keyed by kind.
#[derive(Debug, Default)]
pub(crate) struct AuxParts {
    parts: BTreeMap<AuxKind, LoadedPart>,
}

impl AuxParts {
    /// Load every document-wide part the package already has.
    pub(crate) fn load(pkg: &WordPackage) -> Result<Self> {
        let mut parts = BTreeMap::new();
        for kind in AuxKind::ALL {
            let related = pkg
                .opc_package()
                .related_partname(pkg.main_partname(), kind.reltype())?;
            if let Some(partname) = related
                && pkg.opc_package().contains_part(&partname)
            {
                let doc = pkg.load_xml(&partname)?;
                parts.insert(kind, LoadedPart { partname, doc });
            }
        }
        Ok(Self { parts })
    }

    pub(crate) fn docs(&self) -> impl Iterator<Item = &XmlDocument> {
        self.parts.values().map(|part| &part.doc)
    }

    /// The part of `kind`, creating an empty one shaped like `like` if missing.
    fn ensure(
        &mut self,
        out: &mut OpcPackage,
        out_main: &PackURI,
        kind: AuxKind,
        like: &XmlDocument,
    ) -> Result<&mut LoadedPart> {
        match self.parts.entry(kind) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let part = create_part(out, out_main, kind, like)?;
                Ok(entry.insert(part))
            },
        }
    }

    /// Serialize every tree back into its part.
    pub(crate) fn store(self, out: &mut OpcPackage) -> Result<()> {
        for part in self.parts.into_values() {
            out.get_part_mut(&part.partname)?.set_xml(&part.doc)?;
        }
        Ok(())
    }
}

fn create_part(
    out: &mut OpcPackage,
    out_main: &PackURI,
    kind: AuxKind,
    like: &XmlDocument,
) -> Result<LoadedPart> {
    let root_name = like
        .root()
        .and_then(|root| like.name(root))
        .cloned()
        .unwrap_or_else(|| XName::w(kind.item_local()));
    let mut doc = XmlDocument::with_root(root_name);
    if let (Some(root), Some(like_root)) = (doc.root(), like.root()) {
        merge_namespaces(&mut doc, root, like, like_root);
    }

    let partname = out.next_partname(kind.partname_template())?;
    out.add_part(Box::new(XmlPart::from_document(
        partname.clone(),
        kind.content_type(),
        &doc,
    )?));
    out.get_part_mut(out_main)?.relate_to(&partname, kind.reltype());
    debug!(part = %partname, "created part missing from base document");
    Ok(LoadedPart { partname, doc })
}

/// Copy namespace declarations and `mc:Ignorable` prefixes from a source root.
///
/// A prefix already bound to another namespace in the output keeps the
/// output binding.
pub(crate) fn merge_namespaces(
    out: &mut XmlDocument,
    out_root: NodeId,
    src: &XmlDocument,
    src_root: NodeId,
) {
    let Some(src_attrs) = src.get(src_root).and_then(|n| n.attributes()) else {
        return;
    };

    for attr in src_attrs.iter().filter(|a| a.name.is_xmlns()) {
        let existing = out
            .get(out_root)
            .and_then(|n| n.attributes())
            .and_then(|attrs| attrs.iter().find(|a| a.name == attr.name))
            .map(|a| a.value.clone());
        match existing {
            None => {
                if let Some(attrs) = out.attributes_mut(out_root) {
                    attrs.push(attr.clone());
                }
            },
            Some(value) if value != attr.value => {
                warn!(prefix = %attr.name, "namespace prefix bound differently, keeping output binding");
            },
            Some(_) => {},
        }
    }

    let Some(src_ignorable) = src_attrs
        .iter()
        .find(|a| a.name.is(MC_NS, "Ignorable"))
    else {
        return;
    };
    let mut prefixes: Vec<String> = out
        .attribute(out_root, Some(MC_NS), "Ignorable")
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    for prefix in src_ignorable.value.split_whitespace() {
        if !prefixes.iter().any(|p| p == prefix) {
            prefixes.push(prefix.to_string());
        }
    }
    out.set_attribute(out_root, src_ignorable.name.clone(), prefixes.join(" "));
}

/// Insert `node` before the first child named one of `locals`, or append it.
fn insert_before_first(doc: &mut XmlDocument, root: NodeId, node: NodeId, locals: &[&str]) {
    let anchor = doc
        .elements(root)
        .find(|&c| locals.iter().any(|local| doc.is_w(c, local)));
    match anchor {
        Some(anchor) => doc.insert_before(anchor, node),
        None => doc.append(root, node),
    }
}

/// Load a source part of `kind`, if the source has one.
fn load_source(src: &WordPackage, kind: AuxKind) -> Result<Option<(PackURI, XmlDocument)>> {
    let related = src
        .opc_package()
        .related_partname(src.main_partname(), kind.reltype())?;
    match related {
        Some(partname) if src.opc_package().contains_part(&partname) => {
            let doc = src.load_xml(&partname)?;
            Ok(Some((partname, doc)))
        },
        _ => Ok(None),
    }
}

/// Append source styles whose identifier the output does not define yet.
pub(crate) fn merge_styles(
    aux: &mut AuxParts,
    out: &mut OpcPackage,
    out_main: &PackURI,
    src: &WordPackage,
    mapper: &mut RelationshipMapper<'_>,
) -> Result<usize> {
    let Some((_, src_doc)) = load_source(src, AuxKind::Styles)? else {
        return Ok(0);
    };
    let Some(src_root) = src_doc.root() else {
        return Ok(0);
    };
    let definitions = src_doc.find_children(src_root, W_NS, "style");
    if definitions.is_empty() {
        return Ok(0);
    }

    let target = aux.ensure(out, out_main, AuxKind::Styles, &src_doc)?;
    let Some(out_root) = target.doc.root() else {
        return Ok(0);
    };
    merge_namespaces(&mut target.doc, out_root, &src_doc, src_root);

    let mut defined: HashSet<String> = target
        .doc
        .find_children(out_root, W_NS, "style")
        .into_iter()
        .filter_map(|s| target.doc.attribute(s, Some(W_NS), "styleId"))
        .map(str::to_string)
        .collect();

    let mut defaults: BTreeMap<String, String> = BTreeMap::new();
    for style in target.doc.find_children(out_root, W_NS, "style") {
        if is_default_style(&target.doc, style) {
            defaults
                .entry(style_type(&target.doc, style).to_string())
                .or_insert_with(|| style_id(&target.doc, style).to_string());
        }
    }

    // Unstyled source content follows the source default, not the output's.
    for (kind, slot) in [
        ("paragraph", &mut mapper.maps.default_paragraph_style),
        ("table", &mut mapper.maps.default_table_style),
    ] {
        let src_default = definitions
            .iter()
            .find(|&&s| is_default_style(&src_doc, s) && style_type(&src_doc, s) == kind)
            .map(|&s| style_id(&src_doc, s));
        if let (Some(src_id), Some(out_id)) = (src_default, defaults.get(kind))
            && src_id != out_id.as_str()
        {
            debug!(kind, source = src_id, output = out_id.as_str(), "default styles differ");
            *slot = Some(src_id.to_string());
        }
    }

    let mut added = 0;
    for style in definitions {
        let Some(id) = src_doc.attribute(style, Some(W_NS), "styleId") else {
            continue;
        };
        if !defined.insert(id.to_string()) {
            debug!(style = id, "style already defined, keeping output definition");
            continue;
        }
        let copy = target.doc.import(&src_doc, style);
        if is_default_style(&src_doc, style) {
            match defaults.entry(style_type(&src_doc, style).to_string()) {
                Entry::Occupied(_) => {
                    target.doc.remove_attribute(copy, Some(W_NS), "default");
                },
                Entry::Vacant(slot) => {
                    slot.insert(id.to_string());
                },
            }
        }
        target.doc.append(out_root, copy);
        remap_content(&mut target.doc, copy, &mapper.maps, &mut mapper.ids);
        added += 1;
    }
    Ok(added)
}

fn is_default_style(doc: &XmlDocument, style: NodeId) -> bool {
    matches!(doc.attribute(style, Some(W_NS), "default"), Some("1" | "true" | "on"))
}

/// `w:type`, which defaults to paragraph.
fn style_type(doc: &XmlDocument, style: NodeId) -> &str {
    doc.attribute(style, Some(W_NS), "type").unwrap_or("paragraph")
}

fn style_id(doc: &XmlDocument, style: NodeId) -> &str {
    doc.attribute(style, Some(W_NS), "styleId").unwrap_or_default()
}

/// Append source numbering definitions under fresh identifiers.
///
/// Fills the mapper's numbering instance map, which later rewrites
/// `w:numId` references in styles and content.
pub(crate) fn merge_numbering(
    aux: &mut AuxParts,
    out: &mut OpcPackage,
    out_main: &PackURI,
    src: &WordPackage,
    mapper: &mut RelationshipMapper<'_>,
) -> Result<()> {
    let Some((src_partname, src_doc)) = load_source(src, AuxKind::Numbering)? else {
        return Ok(());
    };
    let Some(src_root) = src_doc.root() else {
        return Ok(());
    };
    let pictures = src_doc.find_children(src_root, W_NS, "numPicBullet");
    let abstracts = src_doc.find_children(src_root, W_NS, "abstractNum");
    let instances = src_doc.find_children(src_root, W_NS, "num");
    if abstracts.is_empty() && instances.is_empty() {
        return Ok(());
    }

    let target = aux.ensure(out, out_main, AuxKind::Numbering, &src_doc)?;
    let Some(out_root) = target.doc.root() else {
        return Ok(());
    };
    let out_partname = target.partname.clone();
    merge_namespaces(&mut target.doc, out_root, &src_doc, src_root);

    let doc = &mut target.doc;
    let mut picture_ids = IdMap::starting_after(max_attribute(
        doc,
        out_root,
        W_NS,
        "numPicBullet",
        Some(W_NS),
        "numPicBulletId",
    ));
    let mut abstract_ids = IdMap::starting_after(max_attribute(
        doc,
        out_root,
        W_NS,
        "abstractNum",
        Some(W_NS),
        "abstractNumId",
    ));
    mapper.maps.num_ids = IdMap::starting_after(
        max_attribute(doc, out_root, W_NS, "num", Some(W_NS), "numId").max(0),
    );

    for picture in pictures {
        let Some(old) = src_doc.attribute(picture, Some(W_NS), "numPicBulletId") else {
            continue;
        };
        let new = picture_ids.assign(old);
        let copy = doc.import(&src_doc, picture);
        doc.set_attribute(copy, XName::w("numPicBulletId"), new);
        insert_before_first(doc, out_root, copy, &["abstractNum", "num", "numIdMacAtCleanup"]);
        mapper.remap_relationships(out, doc, copy, &src_partname, &out_partname)?;
    }

    for definition in abstracts {
        let Some(old) = src_doc.attribute(definition, Some(W_NS), "abstractNumId") else {
            continue;
        };
        let new = abstract_ids.assign(old);
        let copy = doc.import(&src_doc, definition);
        doc.set_attribute(copy, XName::w("abstractNumId"), new);
        for bullet in doc.find_descendants(copy, W_NS, "lvlPicBulletId") {
            if let Some(mapped) = doc.w_val(bullet).and_then(|v| picture_ids.get(v)) {
                let mapped = mapped.to_string();
                doc.set_attribute(bullet, XName::w("val"), mapped);
            }
        }
        insert_before_first(doc, out_root, copy, &["num", "numIdMacAtCleanup"]);
    }

    for instance in instances {
        let Some(old) = src_doc.attribute(instance, Some(W_NS), "numId") else {
            continue;
        };
        let new = mapper.maps.num_ids.assign(old);
        let copy = doc.import(&src_doc, instance);
        doc.set_attribute(copy, XName::w("numId"), new);
        if let Some(link) = doc.find_child(copy, W_NS, "abstractNumId")
            && let Some(mapped) = doc.w_val(link).and_then(|v| abstract_ids.get(v))
        {
            let mapped = mapped.to_string();
            doc.set_attribute(link, XName::w("val"), mapped);
        }
        insert_before_first(doc, out_root, copy, &["numIdMacAtCleanup"]);
    }
    Ok(())
}

/// Append footnotes, endnotes or comments of a source under fresh ids.
///
/// Separator notes are left out: the output keeps the base document's.
pub(crate) fn merge_annotations(
    aux: &mut AuxParts,
    out: &mut OpcPackage,
    out_main: &PackURI,
    src: &WordPackage,
    mapper: &mut RelationshipMapper<'_>,
    kind: AuxKind,
) -> Result<usize> {
    let Some((src_partname, src_doc)) = load_source(src, kind)? else {
        return Ok(0);
    };
    let Some(src_root) = src_doc.root() else {
        return Ok(0);
    };
    let local = kind.item_local();
    let items: Vec<NodeId> = src_doc
        .find_children(src_root, W_NS, local)
        .into_iter()
        .filter(|&n| {
            src_doc
                .attribute(n, Some(W_NS), "type")
                .is_none_or(|t| t == "normal")
        })
        .collect();
    if items.is_empty() {
        return Ok(0);
    }

    let target = aux.ensure(out, out_main, kind, &src_doc)?;
    let Some(out_root) = target.doc.root() else {
        return Ok(0);
    };
    let out_partname = target.partname.clone();
    merge_namespaces(&mut target.doc, out_root, &src_doc, src_root);

    let floor = if kind == AuxKind::Comments { -1 } else { 0 };
    let mut ids = IdMap::starting_after(
        max_attribute(&target.doc, out_root, W_NS, local, Some(W_NS), "id").max(floor),
    );

    let mut added = 0;
    for item in items {
        let Some(old) = src_doc.attribute(item, Some(W_NS), "id") else {
            continue;
        };
        let new = ids.assign(old);
        let copy = target.doc.import(&src_doc, item);
        target.doc.set_attribute(copy, XName::w("id"), new);
        target.doc.append(out_root, copy);
        mapper.remap_relationships(out, &mut target.doc, copy, &src_partname, &out_partname)?;
        remap_content(&mut target.doc, copy, &mapper.maps, &mut mapper.ids);
        added += 1;
    }

    match kind {
        AuxKind::Footnotes => mapper.maps.footnotes = ids,
        AuxKind::Endnotes => mapper.maps.endnotes = ids,
        AuxKind::Comments => mapper.maps.comments = ids,
        AuxKind::Styles | AuxKind::Numbering => {},
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse;
    use crate::common::xml::xname::XMLNS_NS;
    use crate::ooxml::docx::compose::ids::DocumentIds;
    use crate::ooxml::docx::fixture::{DocxFixture, NS, style};

    #[test]
    fn test_merge_namespaces() {
        let mut out = parse(
            format!(
                r#"<w:document xmlns:w="urn:w" xmlns:mc="{}" xmlns:a="urn:a" mc:Ignorable="a"/>"#,
                MC_NS
            )
            .as_bytes(),
        )
        .unwrap();
        let src = parse(
            format!(
                r#"<w:document xmlns:w="urn:w" xmlns:mc="{}" xmlns:a="urn:other" xmlns:w15="urn:w15" mc:Ignorable="w15 a"/>"#,
                MC_NS
            )
            .as_bytes(),
        )
        .unwrap();
        let out_root = out.root().unwrap();
        merge_namespaces(&mut out, out_root, &src, src.root().unwrap());

        assert_eq!(out.attribute(out_root, Some(XMLNS_NS), "w15"), Some("urn:w15"));
        assert_eq!(out.attribute(out_root, Some(XMLNS_NS), "a"), Some("urn:a"));
        assert_eq!(out.attribute(out_root, Some(MC_NS), "Ignorable"), Some("a w15"));
    }

    #[test]
    fn test_merge_numbering_and_styles() {
        let numbering = concat!(
            r#"<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"/></w:abstractNum>"#,
            r#"<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>"#
        );
        let list_style = r#"<w:style w:type="paragraph" w:styleId="List"><w:name w:val="List"/><w:pPr><w:numPr><w:numId w:val="1"/></w:numPr></w:pPr></w:style>"#;
        let base = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .styles(&style("Normal", "Normal"))
                .numbering(numbering)
                .build(),
        )
        .unwrap();
        let src = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .styles(&format!("{}{}", style("Normal", "Normal"), list_style))
                .numbering(numbering)
                .build(),
        )
        .unwrap();

        let out_main = base.main_partname().clone();
        let mut aux = AuxParts::load(&base).unwrap();
        let mut out = base.into_opc_package();
        let mut mapper = RelationshipMapper::new(src.opc_package(), DocumentIds::default());

        merge_numbering(&mut aux, &mut out, &out_main, &src, &mut mapper).unwrap();
        assert_eq!(merge_styles(&mut aux, &mut out, &out_main, &src, &mut mapper).unwrap(), 1);

        let numbering = &aux.parts[&AuxKind::Numbering].doc;
        let root = numbering.root().unwrap();
        let ids: Vec<&str> = numbering
            .find_children(root, W_NS, "num")
            .into_iter()
            .filter_map(|n| numbering.attribute(n, Some(W_NS), "numId"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        let abstracts = numbering.find_children(root, W_NS, "abstractNum");
        assert_eq!(abstracts.len(), 2);
        // Abstract definitions stay ahead of the instances.
        assert!(numbering.is_w(numbering.first_element_child(root).unwrap(), "abstractNum"));

        let styles = &aux.parts[&AuxKind::Styles].doc;
        let style_root = styles.root().unwrap();
        let num_ids: Vec<&str> = styles
            .find_descendants(style_root, W_NS, "numId")
            .into_iter()
            .filter_map(|n| styles.w_val(n))
            .collect();
        assert_eq!(num_ids, vec!["2"]);
    }

    #[test]
    fn test_merged_styles_keep_one_default_per_type() {
        let defaults = |paragraph: &str, table: &str| {
            format!(
                concat!(
                    r#"<w:style w:type="paragraph" w:default="1" w:styleId="{0}"><w:name w:val="{0}"/></w:style>"#,
                    r#"<w:style w:type="table" w:default="1" w:styleId="{1}"><w:name w:val="{1}"/></w:style>"#,
                    r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont"><w:name w:val="Default Paragraph Font"/></w:style>"#
                ),
                paragraph, table
            )
        };
        let base = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .styles(&defaults("Normal", "TableNormal"))
                .build(),
        )
        .unwrap();
        let src = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .styles(&defaults("Normal-4f1c2", "TableNormal"))
                .build(),
        )
        .unwrap();

        let out_main = base.main_partname().clone();
        let mut aux = AuxParts::load(&base).unwrap();
        let mut out = base.into_opc_package();
        let mut mapper = RelationshipMapper::new(src.opc_package(), DocumentIds::default());

        assert_eq!(merge_styles(&mut aux, &mut out, &out_main, &src, &mut mapper).unwrap(), 1);

        let styles = &aux.parts[&AuxKind::Styles].doc;
        let root = styles.root().unwrap();
        let default_ids: Vec<&str> = styles
            .find_children(root, W_NS, "style")
            .into_iter()
            .filter(|&s| is_default_style(styles, s))
            .map(|s| style_id(styles, s))
            .collect();
        assert_eq!(default_ids, vec!["Normal", "TableNormal", "DefaultParagraphFont"]);

        let imported = styles.find_children(root, W_NS, "style")[3];
        assert_eq!(style_id(styles, imported), "Normal-4f1c2");
        assert_eq!(styles.attribute(imported, Some(W_NS), "default"), None);

        assert_eq!(mapper.maps.default_paragraph_style.as_deref(), Some("Normal-4f1c2"));
        assert_eq!(mapper.maps.default_table_style, None);
    }

    #[test]
    fn test_first_default_is_kept_when_output_has_none() {
        let base = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>").styles(&style("Title", "Title")).build(),
        )
        .unwrap();
        let src = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .styles(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#)
                .build(),
        )
        .unwrap();

        let out_main = base.main_partname().clone();
        let mut aux = AuxParts::load(&base).unwrap();
        let mut out = base.into_opc_package();
        let mut mapper = RelationshipMapper::new(src.opc_package(), DocumentIds::default());
        merge_styles(&mut aux, &mut out, &out_main, &src, &mut mapper).unwrap();

        let styles = &aux.parts[&AuxKind::Styles].doc;
        let root = styles.root().unwrap();
        let normal = styles.find_children(root, W_NS, "style")[1];
        assert!(is_default_style(styles, normal));
        assert_eq!(mapper.maps.default_paragraph_style, None);
    }

    #[test]
    fn test_merge_footnotes_creates_part() {
        let footnotes = format!(
            concat!(
                r#"<w:footnotes {}>"#,
                r#"<w:footnote w:type="separator" w:id="-1"><w:p/></w:footnote>"#,
                r#"<w:footnote w:id="1"><w:p><w:r><w:t>note</w:t></w:r></w:p></w:footnote>"#,
                r#"</w:footnotes>"#
            ),
            NS
        );
        let base = WordPackage::from_bytes(&DocxFixture::new("<w:p/>").build()).unwrap();
        let src = WordPackage::from_bytes(
            &DocxFixture::new("<w:p/>")
                .part("rIdFn", "word/footnotes.xml", ct::WML_FOOTNOTES, rt::FOOTNOTES, footnotes)
                .build(),
        )
        .unwrap();

        let out_main = base.main_partname().clone();
        let mut aux = AuxParts::load(&base).unwrap();
        let mut out = base.into_opc_package();
        let mut mapper = RelationshipMapper::new(src.opc_package(), DocumentIds::default());

        let added =
            merge_annotations(&mut aux, &mut out, &out_main, &src, &mut mapper, AuxKind::Footnotes)
                .unwrap();
        assert_eq!(added, 1);
        assert_eq!(mapper.maps.footnotes.get("1"), Some("1"));

        let created = out
            .related_partname(&out_main, rt::FOOTNOTES)
            .unwrap()
            .unwrap();
        assert_eq!(created.as_str(), "/word/footnotes1.xml");
        assert_eq!(out.get_part(&created).unwrap().content_type(), ct::WML_FOOTNOTES);
    }
}
