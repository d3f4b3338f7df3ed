//! Package parts: a partname, a content type, content bytes and the
//! relationships the part is the source of.
//!
//! XML parts are edited by parsing them into an [`XmlDocument`] and storing
//! the serialized tree back; binary parts are carried through untouched.

use crate::common::xml::{self, XmlDocument};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::rel::Relationships;
use std::fmt::Debug;

/// One part of an OPC package.
pub trait Part: Debug + Send + Sync {
    fn partname(&self) -> &PackURI;

    fn content_type(&self) -> &str;

    fn blob(&self) -> &[u8];

    fn set_blob(&mut self, blob: Vec<u8>);

    /// Relationships whose source is this part.
    fn rels(&self) -> &Relationships;

    fn rels_mut(&mut self) -> &mut Relationships;

    /// Parse the content into a tree.
    fn xml(&self) -> Result<XmlDocument> {
        Ok(xml::parse(self.blob())?)
    }

    /// Replace the content with a serialized tree.
    fn set_xml(&mut self, doc: &XmlDocument) -> Result<()> {
        self.set_blob(xml::serialize(doc)?);
        Ok(())
    }

    /// The rId of an internal relationship to `target`, added if missing.
    fn relate_to(&mut self, target: &PackURI, reltype: &str) -> String {
        let target_ref = target.relative_ref(self.partname().base_uri());
        self.rels_mut().get_or_add(reltype, &target_ref)
    }
}

/// Storage shared by every part kind.
#[derive(Debug)]
struct PartData {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl PartData {
    fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        let rels = Relationships::new(partname.base_uri().to_string());
        Self {
            partname,
            content_type,
            blob,
            rels,
        }
    }
}

macro_rules! impl_part {
    ($ty:ty) => {
        impl Part for $ty {
            #[inline]
            fn partname(&self) -> &PackURI {
                &self.0.partname
            }

            #[inline]
            fn content_type(&self) -> &str {
                &self.0.content_type
            }

            #[inline]
            fn blob(&self) -> &[u8] {
                &self.0.blob
            }

            fn set_blob(&mut self, blob: Vec<u8>) {
                self.0.blob = blob;
            }

            #[inline]
            fn rels(&self) -> &Relationships {
                &self.0.rels
            }

            #[inline]
            fn rels_mut(&mut self) -> &mut Relationships {
                &mut self.0.rels
            }
        }
    };
}

/// Opaque binary content such as media or embedded objects.
#[derive(Debug)]
pub struct BlobPart(PartData);

impl BlobPart {
    pub fn new(partname: PackURI, content_type: String, blob: Vec<u8>) -> Self {
        Self(PartData::new(partname, content_type, blob))
    }
}

/// UTF-8 XML content.
#[derive(Debug)]
pub struct XmlPart(PartData);

impl XmlPart {
    pub fn new(partname: PackURI, content_type: String, xml: Vec<u8>) -> Self {
        Self(PartData::new(partname, content_type, xml))
    }

    /// Like [`XmlPart::new`], but rejects content that is not UTF-8.
    pub fn load(partname: PackURI, content_type: String, xml: Vec<u8>) -> Result<Self> {
        if let Err(e) = std::str::from_utf8(&xml) {
            return Err(OpcError::XmlError(format!("{partname} is not UTF-8: {e}")));
        }
        Ok(Self::new(partname, content_type, xml))
    }

    pub fn from_document(partname: PackURI, content_type: &str, doc: &XmlDocument) -> Result<Self> {
        let xml = xml::serialize(doc)?;
        Ok(Self::new(partname, content_type.to_string(), xml))
    }
}

impl_part!(BlobPart);
impl_part!(XmlPart);

/// Picks the part kind from the content type.
pub struct PartFactory;

impl PartFactory {
    pub fn load(partname: PackURI, content_type: String, blob: Vec<u8>) -> Result<Box<dyn Part>> {
        let part: Box<dyn Part> = if is_xml_content_type(&content_type) {
            Box::new(XmlPart::load(partname, content_type, blob)?)
        } else {
            Box::new(BlobPart::new(partname, content_type, blob))
        };
        Ok(part)
    }
}

#[inline]
fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type.ends_with("/xml")
}
