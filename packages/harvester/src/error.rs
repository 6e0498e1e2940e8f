//! Error types for the harvester.
//!
//! Extraction itself never fails: missing markup leaves fields unset. Errors
//! come from the network, the filesystem and output serialization.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// HTTP client could not be built or a request failed before a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Fetching a detail or search page failed.
    #[error("Failed to fetch page {url}: {source}")]
    PageFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Downloading a PDF failed.
    #[error("Failed to download PDF {url}: {source}")]
    PdfDownload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A URL could not be parsed or joined.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A record lacks part of its natural key.
    #[error("Missing required fields (jenis, nomor, or tahun)")]
    MissingFields,

    /// A record has no PDF link.
    #[error("No PDF URL found")]
    NoPdfUrl,

    /// PDF text extraction failed.
    #[error("PDF text extraction failed: {0}")]
    PdfExtract(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
