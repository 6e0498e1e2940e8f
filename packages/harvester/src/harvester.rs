//! Harvesting operations that tie fetching, extraction and conversion together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detail::parse_detail_page;
use crate::error::{HarvesterError, Result};
use crate::http::Fetcher;
use crate::pdf::{convert_pdf, sha256_hex, TextExtractor};
use crate::types::RegulationRecord;

/// Fetch a detail page and extract its record.
pub async fn scrape_regulation(fetcher: &dyn Fetcher, url: &str) -> Result<RegulationRecord> {
    let html = fetcher.fetch_page(url).await?;
    let record = parse_detail_page(&html, url);
    tracing::debug!(
        url,
        jenis = ?record.jenis,
        nomor = ?record.nomor,
        tahun = ?record.tahun,
        "Extracted detail page"
    );
    Ok(record)
}

/// Convert PDF bytes to the markdown artifact on the blocking pool.
pub async fn pdf_to_markdown(
    extractor: Arc<dyn TextExtractor>,
    record: &RegulationRecord,
    bytes: Arc<[u8]>,
) -> Result<String> {
    let record = record.clone();
    tokio::task::spawn_blocking(move || convert_pdf(extractor.as_ref(), &record, &bytes))
        .await
        .map_err(|e| HarvesterError::PdfExtract(e.to_string()))?
}

/// Files written by [`download_regulation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub pdf_path: PathBuf,
    pub md_path: PathBuf,
    pub pdf_sha256: String,
    pub pdf_bytes: usize,
}

/// Download a record's PDF and write it with its markdown under `dir`.
///
/// Files land at `dir/{JENIS}/{tahun}/{nomor-slug}.pdf` and `.md`.
pub async fn download_regulation(
    fetcher: &dyn Fetcher,
    extractor: Arc<dyn TextExtractor>,
    record: &RegulationRecord,
    dir: &Path,
) -> Result<SavedArtifacts> {
    let key = record.natural_key().ok_or(HarvesterError::MissingFields)?;
    let pdf_url = record.pdf_url.as_deref().ok_or(HarvesterError::NoPdfUrl)?;

    let bytes: Arc<[u8]> = fetcher.fetch_pdf(pdf_url).await?.into();
    let pdf_sha256 = sha256_hex(&bytes);
    let markdown = pdf_to_markdown(extractor, record, Arc::clone(&bytes)).await?;

    let (pdf_rel, md_rel) = key.storage_paths();
    let pdf_path = dir.join(pdf_rel);
    let md_path = dir.join(md_rel);
    if let Some(parent) = pdf_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&pdf_path, &bytes).await?;
    tokio::fs::write(&md_path, markdown).await?;

    tracing::info!(%key, path = %pdf_path.display(), "Saved regulation artifacts");

    Ok(SavedArtifacts {
        pdf_path,
        md_path,
        pdf_sha256,
        pdf_bytes: bytes.len(),
    })
}
