//! Corpus preparation: PDF text extraction and document building.
//!
//! [`prepare_corpus`] turns a directory of scheme PDFs into [`Document`]s
//! with globally sequential ids, ready for [`RagService::add_documents`].
//!
//! [`RagService::add_documents`]: crate::RagService::add_documents

use std::path::{Path, PathBuf};

use lopdf::Document as PdfDocument;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunking::Chunker;
use crate::document::Document;
use crate::error::{RagError, Result};

/// Chunk count for one processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File name without directory.
    pub filename: String,
    /// Number of chunks produced.
    pub chunks: usize,
}

/// A file that produced no documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// File name without directory.
    pub filename: String,
    /// Why it was skipped.
    pub reason: String,
}

/// The documents built from a corpus directory, plus what happened per file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusReport {
    /// Documents ready for indexing.
    pub documents: Vec<Document>,
    /// Files that produced chunks.
    pub files: Vec<FileReport>,
    /// Files that produced nothing.
    pub skipped: Vec<SkippedFile>,
}

fn corpus_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::CorpusError { path: path.display().to_string(), message: message.into() }
}

/// Extract the text of every page of a PDF, in page order.
///
/// Pages are joined with a newline; pages without extractable text are
/// skipped.
///
/// # Errors
///
/// Returns [`RagError::CorpusError`] if the file cannot be loaded.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    let pdf = PdfDocument::load(path).map_err(|e| corpus_error(path, format!("failed to load PDF: {e}")))?;

    let mut text = String::new();
    // get_pages is keyed by page number, in order.
    for page_number in pdf.get_pages().keys() {
        match pdf.extract_text(&[*page_number]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => debug!(path = %path.display(), page = page_number, "page has no text"),
            Err(e) => {
                warn!(path = %path.display(), page = page_number, error = %e, "failed to extract page text")
            }
        }
    }
    Ok(text)
}

/// List the `*.pdf` files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`RagError::CorpusError`] if the directory cannot be read.
pub fn pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| corpus_error(dir, e.to_string()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Chunk `text` and wrap each chunk in a [`Document`], numbering ids from
/// `first_id`.
///
/// Each document records `filename`, `chunk_index`, and `total_chunks`.
pub fn documents_from_text(
    text: &str,
    filename: &str,
    first_id: u64,
    chunker: &dyn Chunker,
) -> Vec<Document> {
    let chunks = chunker.chunk(text);
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Document::new(first_id + i as u64, chunk, filename)
                .with_metadata("filename", filename)
                .with_metadata("chunk_index", i)
                .with_metadata("total_chunks", total)
        })
        .collect()
}

/// Build documents from every PDF in `dir`.
///
/// Unreadable files and files without text are recorded in
/// [`CorpusReport::skipped`] rather than failing the run.
///
/// # Errors
///
/// Returns [`RagError::CorpusError`] only if `dir` itself cannot be read.
pub fn prepare_corpus(dir: &Path, chunker: &dyn Chunker) -> Result<CorpusReport> {
    let files = pdf_files(dir)?;
    info!(dir = %dir.display(), count = files.len(), "found PDF files");

    let mut report = CorpusReport::default();
    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = match extract_pdf_text(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %filename, error = %e, "skipping unreadable PDF");
                report.skipped.push(SkippedFile { filename, reason: e.to_string() });
                continue;
            }
        };

        let next_id = report.documents.len() as u64;
        let documents = documents_from_text(&text, &filename, next_id, chunker);
        if documents.is_empty() {
            warn!(file = %filename, "no text extracted");
            report.skipped.push(SkippedFile { filename, reason: "no text extracted".to_string() });
            continue;
        }

        info!(file = %filename, chunks = documents.len(), "extracted chunks");
        report.files.push(FileReport { filename, chunks: documents.len() });
        report.documents.extend(documents);
    }

    Ok(report)
}
