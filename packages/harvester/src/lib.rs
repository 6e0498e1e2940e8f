//! Regwatch Harvester - Crawl Indonesian regulations from peraturan.bpk.go.id.
//!
//! This crate extracts structured metadata from the BPK regulation portal's
//! detail pages, walks its search results, and turns regulation PDFs into
//! markdown documents.
//!
//! # Example
//!
//! ```
//! use regwatch_harvester::{parse_date, parse_detail_page};
//!
//! assert_eq!(parse_date("17 Agustus 1945").as_deref(), Some("1945-08-17"));
//!
//! let record = parse_detail_page(
//!     "<html></html>",
//!     "https://peraturan.bpk.go.id/Details/5/pp-no-7-tahun-2021",
//! );
//! assert_eq!(record.natural_key().unwrap().to_string(), "PP 7 tahun 2021");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants, rate and path helpers
//! - [`types`]: Core data types (RegulationRecord, Relations, Status, etc.)
//! - [`error`]: Error types and Result alias
//! - [`normalize`]: Text, date, status and citation normalization
//! - [`html`]: HTML navigation helpers
//! - [`builder`]: Write-once extraction state
//! - [`detail`]: Detail page extraction
//! - [`search`]: Search-result pagination
//! - [`http`]: Fetcher trait, HTTP client and rate limiting
//! - [`pdf`]: PDF text extraction and markdown rendering
//! - [`harvester`]: Fetch-and-extract operations
//! - [`cli`]: Command-line interface

pub mod builder;
pub mod cli;
pub mod config;
pub mod detail;
pub mod error;
pub mod harvester;
pub mod html;
pub mod http;
pub mod normalize;
pub mod pdf;
pub mod search;
pub mod types;

// Re-export main functions
pub use detail::parse_detail_page;
pub use harvester::{download_regulation, pdf_to_markdown, scrape_regulation};
pub use normalize::{normalize_status, parse_date};

// Re-export commonly used items
pub use config::{delay_for_rate, nomor_file_stem, sanitize_nomor, HarvesterConfig};
pub use error::{HarvesterError, Result};
pub use http::{Fetcher, HttpFetcher, RateLimited, Throttle};
pub use pdf::{render_markdown, sha256_hex, PdfExtractor, TextExtractor};
pub use search::{build_search_url, extract_detail_links, SearchPages, SearchQuery};
pub use types::{NaturalKey, RegulationRecord, Relation, RelationKind, Relations, Status};
