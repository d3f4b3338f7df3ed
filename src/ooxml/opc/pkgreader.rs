//! Low-level, read-only view of a serialized OPC package.
//!
//! Resolves content types from `[Content_Types].xml`, reads `.rels` parts and
//! walks the relationship graph from the package root so that only reachable
//! parts are loaded.

use crate::common::xml::parse;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::rel::Relationships;
use std::collections::{HashMap, HashSet, VecDeque};

/// A part as loaded from the physical package, before it becomes a `Part`.
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    pub blob: Vec<u8>,
    /// Relationships whose source is this part
    pub rels: Relationships,
}

/// Default and Override entries of `[Content_Types].xml`.
struct ContentTypeMap {
    /// Lower-cased extension to content type
    defaults: HashMap<String, String>,
    /// Lower-cased partname to content type
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let doc = parse(xml)?;
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let Some(root) = doc.root() else {
            return Ok(map);
        };

        for node in doc.elements(root) {
            let Some(content_type) = doc.attribute(node, None, "ContentType") else {
                continue;
            };
            match doc.name(node).map(|n| n.local.as_str()) {
                Some("Default") => {
                    if let Some(ext) = doc.attribute(node, None, "Extension") {
                        map.defaults
                            .insert(ext.to_lowercase(), content_type.to_string());
                    }
                },
                Some("Override") => {
                    if let Some(partname) = doc.attribute(node, None, "PartName") {
                        map.overrides
                            .insert(partname.to_lowercase(), content_type.to_string());
                    }
                },
                _ => {},
            }
        }
        Ok(map)
    }

    /// Override first, then the default for the extension. Partnames compare
    /// case-insensitively.
    fn get(&self, partname: &PackURI) -> Result<String> {
        self.overrides
            .get(&partname.as_str().to_lowercase())
            .or_else(|| self.defaults.get(&partname.ext().to_lowercase()))
            .cloned()
            .ok_or_else(|| OpcError::ContentTypeNotFound(partname.to_string()))
    }
}

/// Serialized parts and package relationships of one package.
pub struct PackageReader {
    pkg_rels: Relationships,
    sparts: Vec<SerializedPart>,
}

impl PackageReader {
    /// Parse the package structure held by a physical reader.
    pub fn from_phys_reader(mut phys_reader: PhysPkgReader) -> Result<Self> {
        let content_types_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        let content_types = ContentTypeMap::from_xml(phys_reader.blob_for(&content_types_uri)?)?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_rels = Self::load_rels(&phys_reader, &package_uri)?;
        let sparts = Self::load_parts(&mut phys_reader, &pkg_rels, &content_types)?;

        Ok(Self { pkg_rels, sparts })
    }

    fn load_rels(phys_reader: &PhysPkgReader, source_uri: &PackURI) -> Result<Relationships> {
        match phys_reader.rels_xml_for(source_uri)? {
            Some(xml) => Relationships::from_xml(xml, source_uri.base_uri()),
            None => Ok(Relationships::new(source_uri.base_uri().to_string())),
        }
    }

    /// Internal targets of `rels`, skipping references that do not resolve.
    fn internal_targets(rels: &Relationships) -> impl Iterator<Item = PackURI> + '_ {
        rels.sorted()
            .into_iter()
            .filter(|rel| !rel.is_external())
            .filter_map(|rel| rel.target_partname().ok())
    }

    /// Walk the relationship graph breadth-first from the package relationships,
    /// taking each reachable part exactly once.
    fn load_parts(
        phys_reader: &mut PhysPkgReader,
        pkg_rels: &Relationships,
        content_types: &ContentTypeMap,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::with_capacity(32);
        let mut visited: HashSet<PackURI> = HashSet::with_capacity(32);
        let mut queue: VecDeque<PackURI> = Self::internal_targets(pkg_rels).collect();

        while let Some(partname) = queue.pop_front() {
            if !visited.insert(partname.clone()) {
                continue;
            }
            // Dangling relationships are common in the wild.
            if !phys_reader.contains(&partname) {
                continue;
            }

            let rels = Self::load_rels(phys_reader, &partname)?;
            queue.extend(Self::internal_targets(&rels).filter(|child| !visited.contains(child)));

            let content_type = content_types.get(&partname)?;
            let blob = phys_reader.take_blob(&partname)?;
            sparts.push(SerializedPart {
                partname,
                content_type,
                blob,
                rels,
            });
        }

        Ok(sparts)
    }

    /// Package-level relationships.
    pub fn take_pkg_rels(&mut self) -> Relationships {
        std::mem::take(&mut self.pkg_rels)
    }

    /// Take ownership of all serialized parts.
    pub fn take_sparts(&mut self) -> Vec<SerializedPart> {
        std::mem::take(&mut self.sparts)
    }
}
