//! Corpus preparation over a scratch directory of PDFs.

use std::path::Path;

use kisan_rag::corpus::{extract_pdf_text, pdf_files, prepare_corpus};
use kisan_rag::BoundaryChunker;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Write a one-page PDF per entry of `pages` with a single line of text each.
fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn extracts_pages_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pm_kisan.pdf");
    write_pdf(&path, &["PM Kisan income support", "Eligibility for landholding farmers"]);

    let text = extract_pdf_text(&path).unwrap();
    let first = text.find("PM Kisan").expect("first page text");
    let second = text.find("Eligibility").expect("second page text");
    assert!(first < second);
}

#[test]
fn lists_only_pdfs_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.pdf"), b"x").unwrap();
    std::fs::write(dir.path().join("A.PDF"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

    let names: Vec<String> = pdf_files(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["A.PDF", "b.pdf"]);
}

#[test]
fn prepares_documents_and_records_skips() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("a_kcc.pdf"), &["Kisan Credit Card offers short term crop loans."]);
    write_pdf(&dir.path().join("b_pmfby.pdf"), &["Crop insurance under PMFBY covers yield losses."]);
    std::fs::write(dir.path().join("c_broken.pdf"), b"not a pdf").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();

    let report = prepare_corpus(dir.path(), &BoundaryChunker::new(512, 100)).unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].filename, "a_kcc.pdf");
    assert_eq!(report.files[1].filename, "b_pmfby.pdf");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].filename, "c_broken.pdf");

    let ids: Vec<u64> = report.documents.iter().map(|d| d.id).collect();
    let expected: Vec<u64> = (0..report.documents.len() as u64).collect();
    assert_eq!(ids, expected);
    assert!(report.documents.iter().any(|d| d.source == "b_pmfby.pdf" && d.text.contains("PMFBY")));
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("documents");
    assert!(prepare_corpus(&missing, &BoundaryChunker::default()).is_err());
}
