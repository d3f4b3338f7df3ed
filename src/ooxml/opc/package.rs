//! Objects that implement reading and writing OPC packages.
//!
//! [`OpcPackage`] holds every reachable part of a package in memory, keyed by
//! partname, together with the package-level relationships.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory OPC package.
///
/// Parts are kept in partname order so that serialization is deterministic.
#[derive(Debug)]
pub struct OpcPackage {
    rels: Relationships,
    parts: BTreeMap<String, Box<dyn Part>>,
}

impl OpcPackage {
    /// A package with no parts and no relationships.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: BTreeMap::new(),
        }
    }

    /// Read a package from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::open(path)?)
    }

    /// Load an OPC package from the bytes of a ZIP archive.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::from_bytes(data)?)
    }

    fn from_phys_reader(phys_reader: PhysPkgReader) -> Result<Self> {
        let pkg_reader = PackageReader::from_phys_reader(phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    /// Convert serialized parts and relationships into the in-memory graph.
    fn unmarshal(mut pkg_reader: PackageReader) -> Result<Self> {
        let mut package = Self::new();
        package.rels = pkg_reader.take_pkg_rels();

        for spart in pkg_reader.take_sparts() {
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob)?;
            *part.rels_mut() = spart.rels;
            package.add_part(part);
        }

        Ok(package)
    }

    /// Serialize the package to the bytes of a ZIP archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Partname of the main document part (the officeDocument target).
    pub fn main_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    /// The part the package's officeDocument relationship points at.
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        let partname = self.main_partname()?;
        self.get_part(&partname)
    }

    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname.as_str())
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname.as_str())
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Partname of the part related to `source` by `reltype`, if any.
    ///
    /// When several relationships of the type exist, the lowest rId wins.
    pub fn related_partname(&self, source: &PackURI, reltype: &str) -> Result<Option<PackURI>> {
        let part = self.get_part(source)?;
        part.rels()
            .all_with_reltype(reltype)
            .into_iter()
            .find(|rel| !rel.is_external())
            .map(|rel| rel.target_partname())
            .transpose()
    }

    /// Partnames of every part related to `source` by `reltype`, in rId order.
    pub fn related_partnames(&self, source: &PackURI, reltype: &str) -> Result<Vec<PackURI>> {
        let part = self.get_part(source)?;
        part.rels()
            .all_with_reltype(reltype)
            .into_iter()
            .filter(|rel| !rel.is_external())
            .map(|rel| rel.target_partname())
            .collect()
    }

    /// Add a part, replacing any part with the same partname.
    pub fn add_part(&mut self, part: Box<dyn Part>) {
        let partname = part.partname().to_string();
        self.parts.insert(partname, part);
    }

    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }

    /// Iterate over all parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Find the next unused partname for a template with a `%d` placeholder,
    /// e.g. `/word/media/image%d.png`. Numbering starts at 1.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        for n in 1u32..=100_000 {
            let candidate = template.replace("%d", &n.to_string());
            let taken = self
                .parts
                .keys()
                .any(|name| name.eq_ignore_ascii_case(&candidate));
            if !taken {
                return PackURI::new(candidate).map_err(OpcError::InvalidPackUri);
            }
        }
        Err(OpcError::InvalidPackUri(format!(
            "no free partname for template {}",
            template
        )))
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}
