pub mod api;
pub mod config;
pub mod crawl;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use config::{ApiConfig, PipelineConfig};
pub use crawl::{Crawler, ItemError, ItemOutcome};
pub use db::{connect_with_retry, create_pool, run_migrations};
pub use error::PipelineError;
pub use models::{CrawlJob, CrawlParameters, JobErrorEntry, JobStatus, JobUpdate, NewCrawlJob};
pub use store::{BlobStore, JobStore, LocalBlobStore, PgStore, RegulationStore};
