//! Package implementation for Word documents.

use crate::common::xml::XmlDocument;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI};
use std::path::Path;

/// Main document content types accepted as Word documents.
const MAIN_CONTENT_TYPES: [&str; 3] = [
    ct::WML_DOCUMENT_MAIN,
    ct::WML_DOCUMENT_MACRO_ENABLED,
    ct::WML_TEMPLATE_MAIN,
];

/// A Word (.docx) package.
///
/// Wraps an OPC package and resolves the parts the merge passes work on: the
/// main document, its styles, numbering, header and footer parts. Parts are
/// loaded as mutable XML trees with [`load_xml`](Self::load_xml) and written
/// back with [`store_xml`](Self::store_xml).
#[derive(Debug)]
pub struct WordPackage {
    opc: OpcPackage,
    main: PackURI,
}

impl WordPackage {
    /// Open a .docx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Open a .docx package held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    /// Wrap an OPC package, verifying that its main part is a Word document.
    pub fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_partname()
            .map_err(|e| OoxmlError::PartNotFound(format!("main document part: {}", e)))?;
        let main_part = opc
            .get_part(&main)
            .map_err(|e| OoxmlError::PartNotFound(format!("main document part: {}", e)))?;

        let content_type = main_part.content_type();
        if !MAIN_CONTENT_TYPES.contains(&content_type) {
            return Err(OoxmlError::InvalidContentType {
                expected: ct::WML_DOCUMENT_MAIN.to_string(),
                got: content_type.to_string(),
            });
        }

        Ok(Self { opc, main })
    }

    /// Serialize the package back to the bytes of a ZIP archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.opc.to_bytes()?)
    }

    #[inline]
    pub fn main_partname(&self) -> &PackURI {
        &self.main
    }

    /// Style definitions part, if the document has one.
    pub fn styles_partname(&self) -> Result<Option<PackURI>> {
        Ok(self.opc.related_partname(&self.main, rt::STYLES)?)
    }

    /// Numbering definitions part, if the document has one.
    pub fn numbering_partname(&self) -> Result<Option<PackURI>> {
        Ok(self.opc.related_partname(&self.main, rt::NUMBERING)?)
    }

    /// Header parts in relationship order.
    pub fn header_partnames(&self) -> Result<Vec<PackURI>> {
        self.existing(rt::HEADER)
    }

    /// Footer parts in relationship order.
    pub fn footer_partnames(&self) -> Result<Vec<PackURI>> {
        self.existing(rt::FOOTER)
    }

    /// Footnotes, endnotes and comments parts that are present.
    pub fn annotation_partnames(&self) -> Result<Vec<PackURI>> {
        let mut partnames = Vec::new();
        for reltype in [rt::FOOTNOTES, rt::ENDNOTES, rt::COMMENTS] {
            if let Some(partname) = self.opc.related_partname(&self.main, reltype)?
                && self.opc.contains_part(&partname)
            {
                partnames.push(partname);
            }
        }
        Ok(partnames)
    }

    fn existing(&self, reltype: &str) -> Result<Vec<PackURI>> {
        Ok(self
            .opc
            .related_partnames(&self.main, reltype)?
            .into_iter()
            .filter(|partname| self.opc.contains_part(partname))
            .collect())
    }

    /// Raw content of a part.
    pub fn blob(&self, partname: &PackURI) -> Result<&[u8]> {
        Ok(self.opc.get_part(partname)?.blob())
    }

    /// Parse a part into a mutable XML tree.
    pub fn load_xml(&self, partname: &PackURI) -> Result<XmlDocument> {
        Ok(self.opc.get_part(partname)?.xml()?)
    }

    /// Serialize a tree back into a part.
    pub fn store_xml(&mut self, partname: &PackURI, doc: &XmlDocument) -> Result<()> {
        self.opc.get_part_mut(partname)?.set_xml(doc)?;
        Ok(())
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }

    pub fn into_opc_package(self) -> OpcPackage {
        self.opc
    }
}
