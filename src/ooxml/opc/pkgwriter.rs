//! Serializes an [`OpcPackage`] back into a ZIP archive.
//!
//! Entries come out in a fixed order so the same package always produces the
//! same archive.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgWriter;
use std::collections::BTreeMap;
use std::fmt::Write;

pub struct PackageWriter;

impl PackageWriter {
    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        Self::write_content_types(&mut phys_writer, package)?;
        Self::write_pkg_rels(&mut phys_writer, package)?;
        Self::write_parts(&mut phys_writer, package)?;

        phys_writer.finish()
    }

    fn write_content_types(phys_writer: &mut PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        let blob = ContentTypes::from_package(package).to_xml();
        let content_types_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&content_types_uri, blob.as_bytes())
    }

    fn write_pkg_rels(phys_writer: &mut PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        let rels_uri = PackURI::new(PACKAGE_URI)
            .and_then(|uri| uri.rels_uri())
            .map_err(OpcError::InvalidPackUri)?;
        phys_writer.write(&rels_uri, package.rels().to_xml().as_bytes())
    }

    fn write_parts(phys_writer: &mut PhysPkgWriter, package: &OpcPackage) -> Result<()> {
        for part in package.iter_parts() {
            phys_writer.write(part.partname(), part.blob())?;

            if !part.rels().is_empty() {
                let rels_uri = part
                    .partname()
                    .rels_uri()
                    .map_err(OpcError::InvalidPackUri)?;
                phys_writer.write(&rels_uri, part.rels().to_xml().as_bytes())?;
            }
        }
        Ok(())
    }
}

/// Extensions written as a `Default` entry when their content type matches.
const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("rels", ct::OPC_RELATIONSHIPS),
    ("xml", ct::XML),
    ("png", ct::PNG),
    ("jpg", ct::JPEG),
    ("jpeg", ct::JPEG),
    ("gif", ct::GIF),
    ("emf", ct::X_EMF),
    ("wmf", ct::X_WMF),
];

/// Entries of `[Content_Types].xml`, sorted for stable output.
#[derive(Default)]
struct ContentTypes {
    defaults: BTreeMap<String, &'static str>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    fn from_package(package: &OpcPackage) -> Self {
        let mut types = Self::default();
        types.defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS);
        types.defaults.insert("xml".to_string(), ct::XML);
        for part in package.iter_parts() {
            types.add(part.partname(), part.content_type());
        }
        types
    }

    fn add(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_ascii_lowercase();
        let default = DEFAULT_TYPES
            .iter()
            .find(|&&(e, t)| e == ext && t == content_type)
            .map(|&(_, t)| t);
        match default {
            Some(t) => {
                self.defaults.insert(ext, t);
            },
            None => {
                self.overrides
                    .insert(partname.to_string(), content_type.to_string());
            },
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 * (self.defaults.len() + self.overrides.len() + 2));
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n");
        let _ = write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES);
        for (ext, content_type) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            );
        }
        for (partname, content_type) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}
