//! Persistence gateway.
//!
//! The crawler only talks to these traits. [`PgStore`] keeps metadata and
//! jobs in PostgreSQL; [`LocalBlobStore`] keeps PDFs and markdown on disk.

use async_trait::async_trait;
use uuid::Uuid;

use regwatch_harvester::{NaturalKey, RegulationRecord};

use crate::error::Result;
use crate::models::{CrawlJob, JobUpdate, NewCrawlJob, StoredArtifacts};

mod blob;
mod postgres;

pub use blob::LocalBlobStore;
pub use postgres::PgStore;

/// Regulation metadata and cross-references.
#[async_trait]
pub trait RegulationStore: Send + Sync {
    async fn exists_by_natural_key(&self, key: &NaturalKey) -> Result<bool>;

    /// Insert the metadata row and every relation of `record` atomically;
    /// returns the new row's id. On error nothing is stored.
    async fn insert_regulation(
        &self,
        record: &RegulationRecord,
        artifacts: &StoredArtifacts,
    ) -> Result<Uuid>;
}

/// Binary artifact storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, overwriting any existing blob; returns its URL.
    async fn upload_blob(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<String>;
}

/// Crawl job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: NewCrawlJob) -> Result<CrawlJob>;

    async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<CrawlJob>;

    /// Append to the job's error log; `url` is `None` for job-level errors.
    async fn append_job_error(&self, id: Uuid, message: &str, url: Option<&str>) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<CrawlJob>;

    /// Jobs newest first; `page` starts at 1.
    async fn list_jobs(&self, page: u32, limit: u32) -> Result<Vec<CrawlJob>>;
}
