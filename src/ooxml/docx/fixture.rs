//! In-memory .docx packages for unit tests.

use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Namespace declarations used on every fixture root.
pub(crate) const NS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" "#,
    r#"mc:Ignorable="w14""#
);

/// A paragraph style definition.
pub(crate) fn style(id: &str, name: &str) -> String {
    format!(
        r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
        id, name
    )
}

struct Related {
    r_id: String,
    member: String,
    content_type: String,
    reltype: String,
    blob: Vec<u8>,
}

/// Builder for a minimal Word package.
///
/// Headers get relationship ids `rIdH1, rIdH2, ...` and footers
/// `rIdF1, rIdF2, ...` so body markup can reference them.
pub(crate) struct DocxFixture {
    body: String,
    main_content_type: String,
    related: Vec<Related>,
    raw: Vec<(String, Vec<u8>)>,
    headers: usize,
    footers: usize,
}

impl DocxFixture {
    /// A package whose body holds `body` verbatim.
    pub(crate) fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            main_content_type: ct::WML_DOCUMENT_MAIN.to_string(),
            related: Vec::new(),
            raw: Vec::new(),
            headers: 0,
            footers: 0,
        }
    }

    pub(crate) fn main_content_type(mut self, content_type: &str) -> Self {
        self.main_content_type = content_type.to_string();
        self
    }

    /// Add `word/styles.xml` with the given `w:style` children.
    pub(crate) fn styles(self, styles: &str) -> Self {
        let xml = format!(r#"<w:styles {}>{}</w:styles>"#, NS, styles);
        self.part("rIdStyles", "word/styles.xml", ct::WML_STYLES, rt::STYLES, xml)
    }

    /// Add `word/numbering.xml` with the given children.
    pub(crate) fn numbering(self, numbering: &str) -> Self {
        let xml = format!(r#"<w:numbering {}>{}</w:numbering>"#, NS, numbering);
        self.part(
            "rIdNumbering",
            "word/numbering.xml",
            ct::WML_NUMBERING,
            rt::NUMBERING,
            xml,
        )
    }

    pub(crate) fn header(mut self, content: &str) -> Self {
        self.headers += 1;
        let n = self.headers;
        let xml = format!(r#"<w:hdr {}>{}</w:hdr>"#, NS, content);
        self.part(
            &format!("rIdH{}", n),
            &format!("word/header{}.xml", n),
            ct::WML_HEADER,
            rt::HEADER,
            xml,
        )
    }

    pub(crate) fn footer(mut self, content: &str) -> Self {
        self.footers += 1;
        let n = self.footers;
        let xml = format!(r#"<w:ftr {}>{}</w:ftr>"#, NS, content);
        self.part(
            &format!("rIdF{}", n),
            &format!("word/footer{}.xml", n),
            ct::WML_FOOTER,
            rt::FOOTER,
            xml,
        )
    }

    /// Add an arbitrary part related from the main document.
    pub(crate) fn part(
        mut self,
        r_id: &str,
        member: &str,
        content_type: &str,
        reltype: &str,
        blob: impl Into<Vec<u8>>,
    ) -> Self {
        self.related.push(Related {
            r_id: r_id.to_string(),
            member: member.to_string(),
            content_type: content_type.to_string(),
            reltype: reltype.to_string(),
            blob: blob.into(),
        });
        self
    }

    /// Add a zip member that nothing relates to, such as a part's .rels file.
    pub(crate) fn raw(mut self, member: &str, blob: impl Into<Vec<u8>>) -> Self {
        self.raw.push((member.to_string(), blob.into()));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut data));
            let options = SimpleFileOptions::default();

            let mut types = String::from(
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            );
            types.push_str(&format!(
                r#"<Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="{}"/><Default Extension="png" ContentType="{}"/>"#,
                ct::OPC_RELATIONSHIPS,
                ct::XML,
                ct::PNG
            ));
            types.push_str(&format!(
                r#"<Override PartName="/word/document.xml" ContentType="{}"/>"#,
                self.main_content_type
            ));
            for rel in &self.related {
                types.push_str(&format!(
                    r#"<Override PartName="/{}" ContentType="{}"/>"#,
                    rel.member, rel.content_type
                ));
            }
            types.push_str("</Types>");
            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(types.as_bytes()).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer
                .write_all(
                    format!(
                        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="word/document.xml"/></Relationships>"#,
                        rt::OFFICE_DOCUMENT
                    )
                    .as_bytes(),
                )
                .unwrap();

            let mut rels = String::from(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            );
            for rel in &self.related {
                let target = rel.member.strip_prefix("word/").unwrap_or(rel.member.as_str());
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                    rel.r_id, rel.reltype, target
                ));
            }
            rels.push_str("</Relationships>");
            writer.start_file("word/_rels/document.xml.rels", options).unwrap();
            writer.write_all(rels.as_bytes()).unwrap();

            writer.start_file("word/document.xml", options).unwrap();
            writer
                .write_all(
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
                        NS, self.body
                    )
                    .as_bytes(),
                )
                .unwrap();

            for rel in &self.related {
                writer.start_file(rel.member.as_str(), options).unwrap();
                writer.write_all(&rel.blob).unwrap();
            }

            for (member, blob) in &self.raw {
                writer.start_file(member.as_str(), options).unwrap();
                writer.write_all(blob).unwrap();
            }

            writer.finish().unwrap();
        }
        data
    }
}
