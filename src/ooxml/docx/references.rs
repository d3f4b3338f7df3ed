//! Rewrite style references inside a WordprocessingML subtree.

use crate::common::xml::{W_NS, XName, XmlDocument};
use indextree::NodeId;

/// Rewrite every style reference equal to `old` under `root` (inclusive) to `new`.
///
/// Covers paragraph styles (`w:p/w:pPr/w:pStyle`), paragraph mark run styles
/// (`w:p/w:pPr/w:rPr/w:rStyle`), run styles (`w:r/w:rPr/w:rStyle`) and table
/// styles (`w:tbl/w:tblPr/w:tblStyle`). Returns the number of references
/// rewritten.
pub fn update_style_references(
    doc: &mut XmlDocument,
    root: NodeId,
    old: &str,
    new: &str,
) -> usize {
    let targets = style_reference_nodes(doc, root);

    let mut rewritten = 0;
    for target in targets {
        if doc.w_val(target) == Some(old) {
            doc.set_attribute(target, XName::w("val"), new);
            rewritten += 1;
        }
    }
    rewritten
}

/// All style reference elements under `root`, in document order.
pub(crate) fn style_reference_nodes(doc: &XmlDocument, root: NodeId) -> Vec<NodeId> {
    let mut targets = Vec::new();
    for node in std::iter::once(root).chain(doc.descendants(root)) {
        if doc.is_w(node, "p") {
            if let Some(ppr) = doc.find_child(node, W_NS, "pPr") {
                targets.extend(doc.find_child(ppr, W_NS, "pStyle"));
                if let Some(rpr) = doc.find_child(ppr, W_NS, "rPr") {
                    targets.extend(doc.find_child(rpr, W_NS, "rStyle"));
                }
            }
        } else if doc.is_w(node, "r") {
            if let Some(rpr) = doc.find_child(node, W_NS, "rPr") {
                targets.extend(doc.find_child(rpr, W_NS, "rStyle"));
            }
        } else if doc.is_w(node, "tbl") {
            for tbl_pr in doc.find_children(node, W_NS, "tblPr") {
                targets.extend(doc.find_child(tbl_pr, W_NS, "tblStyle"));
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::parse;
    use crate::ooxml::docx::fixture::NS;
    use proptest::prelude::*;

    fn document(body: &str) -> XmlDocument {
        parse(format!("<w:document {}><w:body>{}</w:body></w:document>", NS, body).as_bytes())
            .unwrap()
    }

    fn values(doc: &XmlDocument) -> Vec<String> {
        let root = doc.root().unwrap();
        style_reference_nodes(doc, root)
            .into_iter()
            .filter_map(|n| doc.w_val(n).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_updates_paragraph_run_and_table() {
        let body = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="H1"/><w:rPr><w:rStyle w:val="H1"/></w:rPr></w:pPr>"#,
            r#"<w:r><w:rPr><w:rStyle w:val="H1"/></w:rPr></w:r></w:p>"#,
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="H1"/></w:tblPr><w:tr><w:tc>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Other"/></w:pPr></w:p></w:tc></w:tr></w:tbl>"#
        );
        let mut doc = document(body);
        let root = doc.root().unwrap();

        assert_eq!(update_style_references(&mut doc, root, "H1", "H1-abcde"), 4);
        assert_eq!(values(&doc), vec!["H1-abcde", "H1-abcde", "H1-abcde", "H1-abcde", "Other"]);
    }

    #[test]
    fn test_missing_properties_are_skipped() {
        let mut doc = document(r#"<w:p><w:r><w:t>x</w:t></w:r></w:p><w:tbl/>"#);
        let root = doc.root().unwrap();
        assert_eq!(update_style_references(&mut doc, root, "H1", "H2"), 0);
    }

    #[test]
    fn test_style_like_elements_elsewhere_are_ignored() {
        // A pStyle outside a paragraph's pPr is not a paragraph reference.
        let mut doc = document(r#"<w:sectPr><w:pStyle w:val="H1"/></w:sectPr>"#);
        let root = doc.root().unwrap();
        assert_eq!(update_style_references(&mut doc, root, "H1", "H2"), 0);
    }

    fn reference() -> impl Strategy<Value = (u8, &'static str)> {
        (0u8..3, prop::sample::select(vec!["A", "B", "C"]))
    }

    fn markup((kind, id): (u8, &'static str)) -> String {
        match kind {
            0 => format!(r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr></w:p>"#, id),
            1 => format!(r#"<w:p><w:r><w:rPr><w:rStyle w:val="{}"/></w:rPr></w:r></w:p>"#, id),
            _ => format!(r#"<w:tbl><w:tblPr><w:tblStyle w:val="{}"/></w:tblPr></w:tbl>"#, id),
        }
    }

    proptest! {
        #[test]
        fn prop_only_old_references_change(refs in prop::collection::vec(reference(), 0..12)) {
            let body: String = refs.iter().copied().map(markup).collect();
            let mut doc = document(&body);
            let root = doc.root().unwrap();

            let expected: Vec<String> = refs
                .iter()
                .map(|(_, id)| if *id == "A" { "Z".to_string() } else { id.to_string() })
                .collect();
            let olds = refs.iter().filter(|(_, id)| *id == "A").count();

            prop_assert_eq!(update_style_references(&mut doc, root, "A", "Z"), olds);
            prop_assert_eq!(values(&doc), expected);
        }
    }
}
