//! Crawl orchestration.
//!
//! A job walks the search results and processes one detail page at a time:
//! extract, validate, skip duplicates, download and convert the PDF, then
//! persist artifacts, metadata and relations. Item failures are recorded in
//! the job's error log and never stop the crawl.
//!
//! One crawl runs at a time per [`Crawler`]; later jobs stay `pending` until
//! the running one ends. Every portal request goes through the crawler's
//! [`Throttle`], which it shares with on-demand ingestion.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use regwatch_harvester::{
    pdf_to_markdown, scrape_regulation, sha256_hex, Fetcher, HarvesterConfig, HarvesterError,
    NaturalKey, RateLimited, SearchPages, TextExtractor, Throttle,
};

use crate::error::{PipelineError, Result};
use crate::models::{CrawlJob, CrawlParameters, JobStatus, JobUpdate, NewCrawlJob, StoredArtifacts};
use crate::store::{BlobStore, JobStore, RegulationStore};

/// Message recorded when a job is cancelled before finishing.
pub const CANCELLED_MESSAGE: &str = "crawl cancelled";

/// Result of processing one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Success {
        regulation_id: Uuid,
        key: NaturalKey,
    },
    /// The natural key already exists; nothing was written.
    Skipped { key: NaturalKey },
}

/// Why a detail page could not be processed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0}")]
    Fetch(HarvesterError),

    #[error("Missing required fields (jenis, nomor, or tahun)")]
    MissingFields,

    #[error("No PDF URL found")]
    NoPdfUrl,

    #[error("PDF conversion failed: {0}")]
    Conversion(HarvesterError),

    #[error("{0}")]
    Persistence(PipelineError),
}

/// Runs crawl jobs against the configured stores.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn TextExtractor>,
    regulations: Arc<dyn RegulationStore>,
    blobs: Arc<dyn BlobStore>,
    jobs: Arc<dyn JobStore>,
    config: HarvesterConfig,
    throttle: Throttle,
    running: Mutex<()>,
}

impl Crawler {
    /// `fetcher` is wrapped in a rate limiter per job; pass it unthrottled.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn TextExtractor>,
        regulations: Arc<dyn RegulationStore>,
        blobs: Arc<dyn BlobStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            regulations,
            blobs,
            jobs,
            config: HarvesterConfig::default(),
            throttle: Throttle::new(),
            running: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: HarvesterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn jobs(&self) -> &Arc<dyn JobStore> {
        &self.jobs
    }

    /// The gate every portal request of this crawler passes through.
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Create a job and run it to completion, after any crawl already
    /// running on this crawler.
    ///
    /// Returns the final job record. A job that fails or is cancelled is
    /// still returned with status `failed`; `Err` means the job could not be
    /// created or read back.
    pub async fn run(&self, job: NewCrawlJob, cancel: CancellationToken) -> Result<CrawlJob> {
        let parameters = job.parameters.clone();
        let created = self.jobs.create_job(job).await?;
        let job_id = created.id;

        let _turn = match self.running.try_lock() {
            Ok(turn) => turn,
            Err(_) => {
                tracing::info!(%job_id, "waiting for running crawl");
                tokio::select! {
                    turn = self.running.lock() => turn,
                    () = cancel.cancelled() => {
                        tracing::warn!(%job_id, "crawl cancelled while pending");
                        self.fail_job(job_id, CANCELLED_MESSAGE).await;
                        return self.jobs.get_job(job_id).await;
                    }
                }
            }
        };

        match self.crawl(job_id, &parameters, &cancel).await {
            Ok(CrawlEnd::Finished) => {}
            Ok(CrawlEnd::Cancelled) => {
                tracing::warn!(%job_id, "crawl cancelled");
                self.fail_job(job_id, CANCELLED_MESSAGE).await;
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "crawl failed");
                self.fail_job(job_id, &format!("Crawl failed: {e}")).await;
            }
        }

        self.jobs.get_job(job_id).await
    }

    async fn crawl(
        &self,
        job_id: Uuid,
        parameters: &CrawlParameters,
        cancel: &CancellationToken,
    ) -> Result<CrawlEnd> {
        self.jobs
            .update_job(
                job_id,
                JobUpdate::status(JobStatus::Running).with_started_at(Utc::now()),
            )
            .await?;
        tracing::info!(%job_id, max_items = parameters.max_items, rate = parameters.rate, "crawl started");

        let fetcher = RateLimited::new(Arc::clone(&self.fetcher), parameters.rate)
            .with_throttle(self.throttle.clone());
        let mut pages = SearchPages::new(
            &fetcher,
            &self.config,
            parameters.search_query(),
            parameters.max_items as usize,
        );

        let mut crawled = 0;
        let mut skipped = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(CrawlEnd::Cancelled);
            }
            let Some(url) = pages.next_url().await else {
                break;
            };

            match self.process_item(&fetcher, &url).await {
                Ok(ItemOutcome::Success { regulation_id, key }) => {
                    crawled += 1;
                    tracing::info!(%job_id, url = %url, %regulation_id, %key, "regulation processed");
                }
                Ok(ItemOutcome::Skipped { key }) => {
                    skipped += 1;
                    tracing::info!(%job_id, url = %url, %key, "regulation already exists, skipped");
                }
                Err(e) => {
                    tracing::warn!(%job_id, url = %url, error = %e, "item failed");
                    self.jobs
                        .append_job_error(job_id, &e.to_string(), Some(&url))
                        .await?;
                }
            }

            self.jobs
                .update_job(job_id, JobUpdate::counters(crawled, skipped))
                .await?;
        }

        self.jobs
            .update_job(
                job_id,
                JobUpdate::status(JobStatus::Completed)
                    .with_completed_at(Utc::now())
                    .with_counters(crawled, skipped),
            )
            .await?;
        tracing::info!(%job_id, crawled, skipped, "crawl completed");

        Ok(CrawlEnd::Finished)
    }

    /// Mark a job failed and log the reason; secondary failures are only logged.
    async fn fail_job(&self, job_id: Uuid, message: &str) {
        let update = JobUpdate::status(JobStatus::Failed).with_completed_at(Utc::now());
        if let Err(e) = self.jobs.update_job(job_id, update).await {
            tracing::error!(%job_id, error = %e, "failed to mark job failed");
        }
        if let Err(e) = self.jobs.append_job_error(job_id, message, None).await {
            tracing::error!(%job_id, error = %e, "failed to record job error");
        }
    }

    /// Process one detail page.
    pub async fn process_item(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
    ) -> std::result::Result<ItemOutcome, ItemError> {
        let record = scrape_regulation(fetcher, url)
            .await
            .map_err(ItemError::Fetch)?;
        let key = record.natural_key().ok_or(ItemError::MissingFields)?;

        if self
            .regulations
            .exists_by_natural_key(&key)
            .await
            .map_err(ItemError::Persistence)?
        {
            return Ok(ItemOutcome::Skipped { key });
        }

        let pdf_url = record.pdf_url.as_deref().ok_or(ItemError::NoPdfUrl)?;
        let bytes: Arc<[u8]> = fetcher
            .fetch_pdf(pdf_url)
            .await
            .map_err(ItemError::Fetch)?
            .into();
        let pdf_sha256 = sha256_hex(&bytes);
        let markdown = pdf_to_markdown(Arc::clone(&self.extractor), &record, Arc::clone(&bytes))
            .await
            .map_err(ItemError::Conversion)?;

        let (pdf_path, txt_path) = key.storage_paths();
        self.blobs
            .upload_blob(&bytes, &pdf_path, "application/pdf")
            .await
            .map_err(ItemError::Persistence)?;
        self.blobs
            .upload_blob(markdown.as_bytes(), &txt_path, "text/markdown")
            .await
            .map_err(ItemError::Persistence)?;

        let artifacts = StoredArtifacts {
            pdf_path,
            txt_path,
            pdf_sha256,
        };
        let regulation_id = self
            .regulations
            .insert_regulation(&record, &artifacts)
            .await
            .map_err(ItemError::Persistence)?;

        Ok(ItemOutcome::Success { regulation_id, key })
    }
}

enum CrawlEnd {
    Finished,
    Cancelled,
}
