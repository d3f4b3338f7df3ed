//! The merge pipeline.
//!
//! Every input is opened, its content parts normalized and its styles
//! resolved against the names seen in earlier inputs. The preprocessed
//! packages are then handed, in input order, to a [`Composer`].
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_merge::merge::{MergeOptions, merge_files};
//!
//! merge_files(&["intro.docx", "body.docx"], "book.docx", &MergeOptions::default())?;
//! # Ok::<(), docx_merge::common::Error>(())
//! ```

mod config;

pub use config::{MergeOptions, NamePolicy};

use crate::common::error::{Error, Result};
use crate::ooxml::docx::{
    Composer, SectionComposer, Source, StyleRegistry, StyleResolver, WordPackage,
    normalize_content_parts,
};
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, info_span, instrument};

/// Merge the documents at `inputs` into `output` with the default composer.
pub fn merge_files<P: AsRef<Path> + Sync>(
    inputs: &[P],
    output: impl AsRef<Path>,
    options: &MergeOptions,
) -> Result<()> {
    merge_with(&SectionComposer::new(), inputs, output, options)
}

/// Merge the documents at `inputs` into `output` using `composer`.
///
/// Nothing is written unless every input was read and preprocessed.
#[instrument(name = "merge", skip_all, fields(inputs = inputs.len()))]
pub fn merge_with<P: AsRef<Path> + Sync>(
    composer: &dyn Composer,
    inputs: &[P],
    output: impl AsRef<Path>,
    options: &MergeOptions,
) -> Result<()> {
    let output = output.as_ref();

    // Reading is the only stage free of shared state.
    let buffers = inputs
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            std::fs::read(path).map_err(|e| Error::from(e).for_input(path))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut registry = StyleRegistry::new();
    let mut sources = Vec::with_capacity(buffers.len());
    for (index, (path, bytes)) in inputs.iter().zip(&buffers).enumerate() {
        let path = path.as_ref();
        let _span = info_span!("preprocess", index, path = %path.display()).entered();
        let source =
            preprocess(bytes, index, &mut registry, options).map_err(|e| e.for_input(path))?;
        sources.push(source);
    }

    let merged = composer.compose(&sources)?;
    std::fs::write(output, &merged).map_err(|source| Error::Output {
        path: output.to_path_buf(),
        source,
    })?;
    info!(
        output = %output.display(),
        documents = sources.len(),
        bytes = merged.len(),
        "wrote merged document"
    );
    Ok(())
}

/// Merge in-memory packages with the default composer.
pub fn merge_bytes<B: AsRef<[u8]>>(inputs: &[B], options: &MergeOptions) -> Result<Vec<u8>> {
    let _span = info_span!("merge", inputs = inputs.len()).entered();
    let sources = prepare_sources(inputs, options)?;
    SectionComposer::new().compose(&sources)
}

/// Preprocess in-memory packages in order, sharing one style registry.
pub fn prepare_sources<B: AsRef<[u8]>>(inputs: &[B], options: &MergeOptions) -> Result<Vec<Source>> {
    let mut registry = StyleRegistry::new();
    inputs
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            let _span = info_span!("preprocess", index).entered();
            preprocess(bytes.as_ref(), index, &mut registry, options)
        })
        .collect()
}

/// Run both passes over the package at position `index` and wrap the result.
///
/// The registry must have seen exactly the documents before `index`.
pub fn preprocess(
    bytes: &[u8],
    index: usize,
    registry: &mut StyleRegistry,
    options: &MergeOptions,
) -> Result<Source> {
    let mut pkg = WordPackage::from_bytes(bytes)?;
    let constructs = if options.normalize_content_parts {
        normalize_content_parts(&mut pkg)?
    } else {
        0
    };
    let report = StyleResolver::new(options).resolve(&mut pkg, index, registry)?;
    info!(
        constructs,
        renamed = report.renames.len(),
        references = report.references,
        "preprocessed document"
    );

    let bytes = if constructs == 0 && report.is_empty() {
        bytes.to_vec()
    } else {
        pkg.to_bytes()?
    };
    Ok(Source::new(bytes).with_keep_sections(options.keep_sections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::{W_NS, XmlDocument};
    use crate::ooxml::docx::fixture::{DocxFixture, style};
    use std::collections::HashSet;

    fn heading_doc(text: &str) -> Vec<u8> {
        DocxFixture::new(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="H1"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p><w:sectPr/>"#,
            text
        ))
        .styles(&style("H1", "Heading1"))
        .build()
    }

    fn style_defs(pkg: &WordPackage) -> Vec<(String, String)> {
        let styles = pkg.load_xml(&pkg.styles_partname().unwrap().unwrap()).unwrap();
        let root = styles.root().unwrap();
        styles
            .find_children(root, W_NS, "style")
            .into_iter()
            .map(|s| {
                let id = styles.attribute(s, Some(W_NS), "styleId").unwrap().to_string();
                let name = styles
                    .find_child(s, W_NS, "name")
                    .and_then(|n| styles.w_val(n))
                    .unwrap()
                    .to_string();
                (id, name)
            })
            .collect()
    }

    fn paragraphs(doc: &XmlDocument) -> Vec<(String, Option<String>)> {
        let body = doc.find_child(doc.root().unwrap(), W_NS, "body").unwrap();
        doc.find_children(body, W_NS, "p")
            .into_iter()
            .map(|p| {
                let style = doc
                    .find_descendants(p, W_NS, "pStyle")
                    .first()
                    .and_then(|&s| doc.w_val(s))
                    .map(str::to_string);
                (doc.text(p), style)
            })
            .collect()
    }

    #[test]
    fn test_merge_bytes_renames_and_keeps_order() {
        let inputs = vec![heading_doc("one"), heading_doc("two"), heading_doc("three")];
        let merged = merge_bytes(&inputs, &MergeOptions::default()).unwrap();
        let pkg = WordPackage::from_bytes(&merged).unwrap();

        let defs = style_defs(&pkg);
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0], ("H1".to_string(), "Heading1".to_string()));
        let names: HashSet<&str> = defs.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names.len(), 3);

        let main = pkg.load_xml(pkg.main_partname()).unwrap();
        let paras = paragraphs(&main);
        let texts: Vec<&str> = paras.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        // Every paragraph points at the definition of its own document.
        for ((_, style), (id, _)) in paras.iter().zip(&defs) {
            assert_eq!(style.as_deref(), Some(id.as_str()));
        }
    }

    #[test]
    fn test_later_defaults_become_explicit_styles() {
        let doc = |text: &str| {
            DocxFixture::new(&format!(
                concat!(
                    r#"<w:tbl><w:tblPr/><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>"#,
                    r#"<w:p><w:r><w:t>{}</w:t></w:r></w:p>"#,
                    r#"<w:sectPr/>"#
                ),
                text
            ))
            .styles(concat!(
                r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
                r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/></w:style>"#
            ))
            .build()
        };
        let merged = merge_bytes(&[doc("one"), doc("two")], &MergeOptions::default()).unwrap();
        let pkg = WordPackage::from_bytes(&merged).unwrap();

        let styles = pkg.load_xml(&pkg.styles_partname().unwrap().unwrap()).unwrap();
        let style_root = styles.root().unwrap();
        let mut defaults = Vec::new();
        let mut renamed = Vec::new();
        for s in styles.find_children(style_root, W_NS, "style") {
            let id = styles.attribute(s, Some(W_NS), "styleId").unwrap().to_string();
            if styles.attribute(s, Some(W_NS), "default").is_some() {
                defaults.push(id);
            } else {
                renamed.push(id);
            }
        }
        assert_eq!(defaults, vec!["Normal", "TableNormal"]);
        assert_eq!(renamed.len(), 2);

        let main = pkg.load_xml(pkg.main_partname()).unwrap();
        let paras = paragraphs(&main);
        assert_eq!(paras[0], ("one".to_string(), None));
        assert_eq!(paras[1], ("two".to_string(), Some(renamed[0].clone())));

        let tbl_styles: Vec<Option<&str>> = main
            .find_descendants(main.root().unwrap(), W_NS, "tblPr")
            .into_iter()
            .map(|t| main.find_child(t, W_NS, "tblStyle").and_then(|s| main.w_val(s)))
            .collect();
        assert_eq!(tbl_styles, vec![None, Some(renamed[1].as_str())]);
    }

    #[test]
    fn test_merge_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.docx");
        let second = dir.path().join("second.docx");
        let output = dir.path().join("merged.docx");
        std::fs::write(&first, heading_doc("first")).unwrap();
        std::fs::write(&second, heading_doc("second")).unwrap();

        merge_files(&[&first, &second], &output, &MergeOptions::default()).unwrap();

        let pkg = WordPackage::open(&output).unwrap();
        let main = pkg.load_xml(pkg.main_partname()).unwrap();
        let texts: Vec<String> = paragraphs(&main).into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_invalid_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.docx");
        let bad = dir.path().join("bad.docx");
        let output = dir.path().join("merged.docx");
        std::fs::write(&good, heading_doc("good")).unwrap();
        std::fs::write(&bad, b"not a zip").unwrap();

        let err = merge_files(&[&good, &bad], &output, &MergeOptions::default()).unwrap_err();
        match err {
            Error::Input { path, .. } => assert_eq!(path, bad),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.docx");
        let output = dir.path().join("merged.docx");

        let err = merge_files(&[&missing], &output, &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.docx");
        std::fs::write(&input, heading_doc("in")).unwrap();
        let output = dir.path().join("no-such-dir").join("out.docx");

        let err = merge_files(&[&input], &output, &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Output { .. }));
    }

    #[test]
    fn test_no_inputs() {
        let inputs: Vec<Vec<u8>> = Vec::new();
        assert!(matches!(
            merge_bytes(&inputs, &MergeOptions::default()),
            Err(Error::NoSources)
        ));
    }

    #[test]
    fn test_preprocess_keeps_untouched_bytes() {
        let bytes = heading_doc("only");
        let mut registry = StyleRegistry::new();
        let source = preprocess(&bytes, 0, &mut registry, &MergeOptions::default()).unwrap();
        assert_eq!(source.bytes(), bytes.as_slice());
        assert!(source.keep_sections());
        assert!(registry.contains_name("Heading1"));
    }
}
