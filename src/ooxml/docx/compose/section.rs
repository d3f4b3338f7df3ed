//! Section-preserving composer.

use super::ids::{DocumentIds, remap_content};
use super::parts::{self, AuxKind, AuxParts, merge_namespaces};
use super::relmap::RelationshipMapper;
use super::{Composer, Source};
use crate::common::error::{Error, Result};
use crate::common::xml::{W_NS, XName, XmlDocument};
use crate::ooxml::docx::package::WordPackage;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{OpcPackage, PackURI};
use indextree::NodeId;
use tracing::{debug, warn};

/// Comment side parts that are not carried over from appended sources.
const UNMERGED_COMMENT_PARTS: [&str; 4] = [
    rt::COMMENTS_EXTENDED,
    rt::COMMENTS_IDS,
    rt::COMMENTS_EXTENSIBLE,
    rt::PEOPLE,
];

/// Appends sources body after body.
///
/// A source's closing `w:sectPr` becomes a section break at the end of its
/// content when the source keeps its sections; otherwise its content flows
/// into the following section. The last source's section properties close
/// the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionComposer;

impl SectionComposer {
    pub fn new() -> Self {
        Self
    }
}

impl Composer for SectionComposer {
    fn compose(&self, sources: &[Source]) -> Result<Vec<u8>> {
        let (base, rest) = sources.split_first().ok_or(Error::NoSources)?;
        let mut output = OutputDocument::open(base)?;
        output.close_section(base.keep_sections(), rest.is_empty());

        for (offset, source) in rest.iter().enumerate() {
            let src = WordPackage::from_bytes(source.bytes())?;
            let is_last = offset + 1 == rest.len();
            output.append(&src, source.keep_sections(), is_last)?;
            debug!(source = offset + 1, "appended source body");
        }
        output.finish()
    }
}

/// The base package being extended.
struct OutputDocument {
    opc: OpcPackage,
    main_partname: PackURI,
    main: XmlDocument,
    body: NodeId,
    aux: AuxParts,
    ids: DocumentIds,
}

impl OutputDocument {
    fn open(base: &Source) -> Result<Self> {
        let pkg = WordPackage::from_bytes(base.bytes())?;
        let main_partname = pkg.main_partname().clone();
        let main = pkg.load_xml(&main_partname)?;
        let body = find_body(&main)?;
        let aux = AuxParts::load(&pkg)?;

        let mut stories = Vec::new();
        for partname in pkg
            .header_partnames()?
            .into_iter()
            .chain(pkg.footer_partnames()?)
        {
            stories.push(pkg.load_xml(&partname)?);
        }
        let ids = DocumentIds::scan(
            std::iter::once(&main)
                .chain(stories.iter())
                .chain(aux.docs()),
        );

        Ok(Self {
            opc: pkg.into_opc_package(),
            main_partname,
            main,
            body,
            aux,
            ids,
        })
    }

    /// Turn the base document's closing section into a break, or drop it.
    fn close_section(&mut self, keep: bool, is_last: bool) {
        if is_last {
            return;
        }
        let Some(section) = self
            .main
            .elements(self.body)
            .filter(|&c| self.main.is_w(c, "sectPr"))
            .last()
        else {
            return;
        };
        self.main.detach(section);
        if keep {
            self.attach_section(section);
        } else {
            self.main.remove(section);
        }
    }

    fn append(&mut self, src: &WordPackage, keep: bool, is_last: bool) -> Result<()> {
        let out_main = self.main_partname.clone();
        let src_main_partname = src.main_partname();

        self.ids.begin_source();
        let mut mapper = RelationshipMapper::new(src.opc_package(), std::mem::take(&mut self.ids));

        parts::merge_numbering(&mut self.aux, &mut self.opc, &out_main, src, &mut mapper)?;
        parts::merge_styles(&mut self.aux, &mut self.opc, &out_main, src, &mut mapper)?;
        for kind in [AuxKind::Footnotes, AuxKind::Endnotes, AuxKind::Comments] {
            parts::merge_annotations(&mut self.aux, &mut self.opc, &out_main, src, &mut mapper, kind)?;
        }
        for reltype in UNMERGED_COMMENT_PARTS {
            if src
                .opc_package()
                .related_partname(src_main_partname, reltype)?
                .is_some()
            {
                warn!(reltype, "comment side part is not merged from appended sources");
            }
        }

        let src_main = src.load_xml(src_main_partname)?;
        let src_body = find_body(&src_main)?;
        if let (Some(out_root), Some(src_root)) = (self.main.root(), src_main.root()) {
            merge_namespaces(&mut self.main, out_root, &src_main, src_root);
        }

        let section = src_main
            .elements(src_body)
            .filter(|&c| src_main.is_w(c, "sectPr"))
            .last();
        let content: Vec<NodeId> = src_main
            .children(src_body)
            .filter(|&c| Some(c) != section)
            .collect();

        for child in content {
            let copy = self.main.import(&src_main, child);
            self.main.append(self.body, copy);
            mapper.remap_relationships(&mut self.opc, &mut self.main, copy, src_main_partname, &out_main)?;
            remap_content(&mut self.main, copy, &mapper.maps, &mut mapper.ids);
        }

        if let Some(section) = section
            && (is_last || keep)
        {
            let copy = self.main.import(&src_main, section);
            mapper.remap_relationships(&mut self.opc, &mut self.main, copy, src_main_partname, &out_main)?;
            if is_last {
                self.main.append(self.body, copy);
            } else {
                self.attach_section(copy);
            }
        }

        self.ids = mapper.into_ids();
        Ok(())
    }

    /// Place a detached `w:sectPr` in the properties of the body's last
    /// paragraph, adding a paragraph when the body does not end in one that
    /// can take it.
    fn attach_section(&mut self, section: NodeId) {
        let doc = &mut self.main;
        let last = doc.elements(self.body).last();
        let paragraph = match last {
            Some(p)
                if doc.is_w(p, "p")
                    && doc
                        .find_child(p, W_NS, "pPr")
                        .and_then(|ppr| doc.find_child(ppr, W_NS, "sectPr"))
                        .is_none() =>
            {
                p
            },
            _ => {
                let name = sibling_name(doc, self.body, "p");
                let p = doc.new_element(name);
                doc.append(self.body, p);
                p
            },
        };

        let properties = match doc.find_child(paragraph, W_NS, "pPr") {
            Some(ppr) => ppr,
            None => {
                let name = sibling_name(doc, self.body, "pPr");
                let ppr = doc.new_element(name);
                let first = doc.children(paragraph).next();
                match first {
                    Some(first) => doc.insert_before(first, ppr),
                    None => doc.append(paragraph, ppr),
                }
                ppr
            },
        };

        match doc.find_child(properties, W_NS, "pPrChange") {
            Some(change) => doc.insert_before(change, section),
            None => doc.append(properties, section),
        }
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.aux.store(&mut self.opc)?;
        self.opc
            .get_part_mut(&self.main_partname)?
            .set_xml(&self.main)?;
        Ok(self.opc.to_bytes()?)
    }
}

fn find_body(doc: &XmlDocument) -> Result<NodeId> {
    doc.root()
        .and_then(|root| doc.find_child(root, W_NS, "body"))
        .ok_or_else(|| Error::InvalidFormat("main document has no w:body".to_string()))
}

/// A WordprocessingML name written with the same prefix as `like`.
fn sibling_name(doc: &XmlDocument, like: NodeId, local: &str) -> XName {
    match doc.name(like) {
        Some(name) => XName {
            local: local.to_string(),
            ..name.clone()
        },
        None => XName::w(local),
    }
}
