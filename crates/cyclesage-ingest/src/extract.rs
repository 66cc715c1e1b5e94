//! Text extraction from source documents.
//!
//! PDFs are read page by page with `pdf-extract`; each page is cleaned and
//! prefixed with a `--- Página N ---` marker. If that fails (error, panic,
//! or no text at all) `lopdf` is tried. Plain-text sources are read as-is.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use cyclesage_core::{Error, Result};
use cyclesage_store::DocumentMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub const METHOD_PDF_EXTRACT: &str = "pdf_extract";
pub const METHOD_LOPDF: &str = "lopdf_fallback";
pub const METHOD_PLAIN_TEXT: &str = "plain_text";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^\w\s.,;:()\-áéíóúñ]").expect("valid regex"));

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    PlainText,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Text and metadata of one source document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of a document.
    ///
    /// Fails with `UnreadableDocument` when every strategy for the format
    /// failed; nothing partial is returned.
    pub fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let kind = SourceKind::from_path(path).ok_or_else(|| {
            Error::UnreadableDocument(format!("unsupported file type: {}", path.display()))
        })?;
        let file_size = std::fs::metadata(path)
            .map_err(|e| Error::UnreadableDocument(format!("{}: {e}", path.display())))?
            .len();
        let source_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let (text, total_pages, method) = match kind {
            SourceKind::PlainText => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| Error::UnreadableDocument(format!("{}: {e}", path.display())))?;
                (text, 1, METHOD_PLAIN_TEXT)
            }
            SourceKind::Pdf => extract_pdf(path)?,
        };

        debug!(
            "Extracted {} chars from {} ({})",
            text.len(),
            source_file,
            method
        );
        Ok(ExtractedDocument {
            text,
            metadata: DocumentMetadata {
                source_file,
                file_size,
                total_pages,
                extraction_method: method.to_string(),
            },
        })
    }
}

fn extract_pdf(path: &Path) -> Result<(String, usize, &'static str)> {
    let primary = std::fs::read(path)
        .map_err(|e| Error::Extraction(e.to_string()))
        .and_then(|bytes| pdf_extract_pages(&bytes));
    choose_pdf_text(path, primary)
}

/// Keep the pdf-extract pages when any of them has text, otherwise read
/// the file again with lopdf.
fn choose_pdf_text(
    path: &Path,
    primary: Result<Vec<String>>,
) -> Result<(String, usize, &'static str)> {
    match primary {
        Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => {
            let total = pages.len();
            Ok((join_pages(&pages), total, METHOD_PDF_EXTRACT))
        }
        Ok(_) => {
            warn!("pdf-extract found no text in {}, trying lopdf", path.display());
            fallback(path)
        }
        Err(e) => {
            warn!("pdf-extract failed on {}: {}. Trying lopdf", path.display(), e);
            fallback(path)
        }
    }
}

fn fallback(path: &Path) -> Result<(String, usize, &'static str)> {
    lopdf_pages(path)
        .map(|(text, pages)| (text, pages, METHOD_LOPDF))
        .map_err(|e| Error::UnreadableDocument(format!("{}: {e}", path.display())))
}

fn pdf_extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    // pdf-extract panics on some malformed inputs.
    panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| Error::Extraction("pdf-extract panicked".into()))?
    .map_err(|e| Error::Extraction(e.to_string()))
}

fn lopdf_pages(path: &Path) -> Result<(String, usize)> {
    let document =
        lopdf::Document::load(path).map_err(|e| Error::Extraction(format!("lopdf: {e}")))?;
    let pages = document.get_pages();
    let mut text = String::new();
    for number in pages.keys() {
        match document.extract_text(&[*number]) {
            Ok(page) => {
                text.push_str(&page);
                text.push('\n');
            }
            Err(e) => warn!("lopdf could not read page {}: {}", number, e),
        }
    }
    if text.trim().is_empty() {
        return Err(Error::Extraction("no text layer".into()));
    }
    Ok((text, pages.len()))
}

/// Join cleaned pages, skipping empty ones, each under a page marker.
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        let cleaned = clean_page_text(page);
        if cleaned.is_empty() {
            continue;
        }
        text.push_str(&format!("\n--- Página {} ---\n{}\n", i + 1, cleaned));
    }
    text
}

/// Drop characters outside the allow-list (word characters, accented
/// letters, basic punctuation) and collapse whitespace.
pub fn clean_page_text(text: &str) -> String {
    let kept = DISALLOWED.replace_all(text, "");
    WHITESPACE.replace_all(&kept, " ").trim().to_string()
}
