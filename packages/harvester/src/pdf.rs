//! PDF text extraction and the markdown artifact.
//!
//! Only embedded text is extracted, page by page. Scanned PDFs produce a note
//! instead of text, and an extraction failure produces a note carrying the
//! error. Either way a markdown document is always produced.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{HarvesterError, Result};
use crate::types::RegulationRecord;

const NO_TEXT_NOTE: &str = "# No embedded text found\n\n\
This PDF appears to be scanned or image-based. OCR is disabled in this service.\n";

/// Extracts embedded text from PDF bytes, one string per page.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// [`TextExtractor`] backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed documents
        match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(HarvesterError::PdfExtract(e.to_string())),
            Err(_) => Err(HarvesterError::PdfExtract(
                "PDF parser panicked on malformed input".to_string(),
            )),
        }
    }
}

/// Metadata header written above the extracted text.
#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    jenis: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nomor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tahun: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    judul: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sumber_ln: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sumber_tln: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
}

impl<'a> FrontMatter<'a> {
    fn from_record(record: &'a RegulationRecord) -> Self {
        let non_empty = |s: &'a str| Some(s).filter(|s| !s.is_empty());
        Self {
            jenis: record.jenis.as_deref(),
            nomor: record.nomor.as_deref(),
            tahun: record.tahun,
            judul: record.judul.as_deref(),
            sumber_ln: non_empty(&record.ln),
            sumber_tln: non_empty(&record.tln),
            // unrecognised status text is kept verbatim
            status: record
                .status
                .map(|s| s.as_str())
                .or_else(|| record.status_raw.as_deref().and_then(non_empty)),
        }
    }

    fn is_empty(&self) -> bool {
        self.jenis.is_none()
            && self.nomor.is_none()
            && self.tahun.is_none()
            && self.judul.is_none()
            && self.sumber_ln.is_none()
            && self.sumber_tln.is_none()
            && self.status.is_none()
    }
}

/// Render the markdown artifact for a regulation.
///
/// `extracted` is the outcome of text extraction, one entry per page; an
/// error becomes an "Extraction error" note rather than a failure. Pages
/// without text are left out but keep their numbering.
pub fn render_markdown(
    record: &RegulationRecord,
    extracted: Result<Vec<String>>,
) -> Result<String> {
    let pages = match extracted {
        Ok(pages) => pages,
        Err(e) => {
            return Ok(format!(
                "# Extraction error\n\nEncountered error while reading PDF:\n\n```\n{e}\n```\n"
            ))
        }
    };

    let pages: Vec<(usize, &str)> = pages
        .iter()
        .enumerate()
        .map(|(i, text)| (i + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty())
        .collect();
    if pages.is_empty() {
        return Ok(NO_TEXT_NOTE.to_string());
    }

    let mut out = String::new();
    let front_matter = FrontMatter::from_record(record);
    if !front_matter.is_empty() {
        out.push_str("---\n");
        out.push_str(&serde_yaml_ng::to_string(&front_matter)?);
        out.push_str("---\n\n");
    }
    out.push_str("# Dokumen Peraturan\n\n");
    for (number, text) in pages {
        out.push_str(&format!("## Halaman {number}\n\n{text}\n\n---\n\n"));
    }
    Ok(out)
}

/// Extract text with `extractor` and render the markdown artifact.
pub fn convert_pdf(
    extractor: &dyn TextExtractor,
    record: &RegulationRecord,
    bytes: &[u8],
) -> Result<String> {
    let extracted = extractor.extract_pages(bytes);
    match &extracted {
        Ok(pages) => tracing::debug!(url = ?record.pdf_url, pages = pages.len(), "PDF text extracted"),
        Err(e) => tracing::warn!(url = ?record.pdf_url, error = %e, "PDF text extraction failed"),
    }
    render_markdown(record, extracted)
}

/// Lowercase hex SHA-256 of `bytes`.
///
/// # Examples
/// ```
/// use regwatch_harvester::pdf::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
