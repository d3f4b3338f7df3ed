//! Collapse alternate content that wraps embedded content parts.
//!
//! Ink and other content parts are stored as `mc:AlternateContent` with an
//! extended `mc:Choice` and a compatible `mc:Fallback`. Content parts do not
//! survive being moved between packages, so each such construct is rewritten
//! to carry the fallback content in place of the choice content, and the
//! fallback branch is dropped.

use crate::common::xml::{MC_NS, W_NS, XmlDocument};
use crate::ooxml::docx::package::WordPackage;
use crate::ooxml::error::Result;
use indextree::NodeId;
use memchr::memmem;
use tracing::debug;

const CONTENT_PART: &str = "contentPart";

/// Normalize the main document body of a package.
///
/// Returns the number of constructs rewritten. The part is only written back
/// when something changed.
pub fn normalize_content_parts(pkg: &mut WordPackage) -> Result<usize> {
    let main = pkg.main_partname().clone();
    if memmem::find(pkg.blob(&main)?, CONTENT_PART.as_bytes()).is_none() {
        return Ok(0);
    }

    let mut doc = pkg.load_xml(&main)?;
    let rewritten = normalize_tree(&mut doc);
    if rewritten > 0 {
        pkg.store_xml(&main, &doc)?;
    }
    Ok(rewritten)
}

/// Normalize every content-part construct inside `w:body` of a parsed document.
pub fn normalize_tree(doc: &mut XmlDocument) -> usize {
    let Some(body) = doc.root().and_then(|root| doc.find_child(root, W_NS, "body")) else {
        return 0;
    };

    let references: Vec<NodeId> = doc
        .descendants(body)
        .filter(|&n| doc.name(n).is_some_and(|name| name.local == CONTENT_PART))
        .collect();

    let mut rewritten = 0;
    for node in references {
        // Gone with a construct rewritten earlier in this loop.
        if doc.is_removed(node) {
            continue;
        }
        let Some(construct) = doc.find_ancestor(node, MC_NS, "AlternateContent") else {
            debug!("content part outside alternate content, skipping");
            continue;
        };
        if collapse_to_fallback(doc, construct) {
            rewritten += 1;
        }
    }
    rewritten
}

/// Replace the choice's first element with the fallback's first element and
/// drop the fallback branch. A construct without a fallback is left alone.
fn collapse_to_fallback(doc: &mut XmlDocument, construct: NodeId) -> bool {
    let Some(fallback) = doc.find_child(construct, MC_NS, "Fallback") else {
        debug!("alternate content has no fallback, already normalized");
        return false;
    };
    let Some(choice) = doc.find_child(construct, MC_NS, "Choice") else {
        debug!("alternate content has no choice, skipping");
        return false;
    };
    let Some(replacement) = doc.first_element_child(fallback) else {
        debug!("fallback branch is empty, skipping");
        return false;
    };

    doc.detach(replacement);
    doc.remove(fallback);
    if let Some(extended) = doc.first_element_child(choice) {
        doc.remove(extended);
    }
    doc.append(choice, replacement);
    true
}
