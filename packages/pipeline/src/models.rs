use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use regwatch_harvester::config::{DEFAULT_JENIS_IDS, DEFAULT_RATE, DEFAULT_YEARS};
use regwatch_harvester::SearchQuery;

/// Default number of detail pages per crawl.
pub const DEFAULT_MAX_ITEMS: u32 = 50;

/// Upper bound on detail pages per crawl.
pub const MAX_ITEMS_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "crawl_job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Filters and pacing of one crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlParameters {
    pub max_items: u32,
    pub years: Vec<i32>,
    pub jenis_ids: Vec<u32>,
    /// Requests per second.
    pub rate: f64,
}

impl Default for CrawlParameters {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            years: DEFAULT_YEARS.to_vec(),
            jenis_ids: DEFAULT_JENIS_IDS.to_vec(),
            rate: DEFAULT_RATE,
        }
    }
}

impl CrawlParameters {
    pub fn with_max_items(mut self, max_items: u32) -> Self {
        self.max_items = max_items.clamp(1, MAX_ITEMS_LIMIT);
        self
    }

    /// Empty lists keep the defaults.
    pub fn with_years(mut self, years: Vec<i32>) -> Self {
        if !years.is_empty() {
            self.years = years;
        }
        self
    }

    /// Empty lists keep the defaults.
    pub fn with_jenis_ids(mut self, jenis_ids: Vec<u32>) -> Self {
        if !jenis_ids.is_empty() {
            self.jenis_ids = jenis_ids;
        }
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            years: self.years.clone(),
            jenis_ids: self.jenis_ids.clone(),
        }
    }
}

/// One entry of a job's error log. `url` is absent for job-level errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CrawlJob {
    pub id: Uuid,
    pub status: JobStatus,
    #[sqlx(json)]
    pub parameters: CrawlParameters,
    pub total_items: i32,
    pub items_crawled: i32,
    pub items_skipped: i32,
    #[sqlx(json)]
    pub error_log: Vec<JobErrorEntry>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewCrawlJob {
    pub parameters: CrawlParameters,
    pub created_by: String,
}

impl NewCrawlJob {
    pub fn new(created_by: impl Into<String>, parameters: CrawlParameters) -> Self {
        Self {
            parameters,
            created_by: created_by.into(),
        }
    }

    /// The requested item count, recorded as the job's total.
    pub fn total_items(&self) -> i32 {
        i32::try_from(self.parameters.max_items).unwrap_or(i32::MAX)
    }
}

/// Partial update of a job; unset fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub items_crawled: Option<i32>,
    pub items_skipped: Option<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn counters(items_crawled: i32, items_skipped: i32) -> Self {
        Self {
            items_crawled: Some(items_crawled),
            items_skipped: Some(items_skipped),
            ..Default::default()
        }
    }

    pub fn with_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_counters(mut self, items_crawled: i32, items_skipped: i32) -> Self {
        self.items_crawled = Some(items_crawled);
        self.items_skipped = Some(items_skipped);
        self
    }
}

/// Where a regulation's artifacts were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifacts {
    pub pdf_path: String,
    pub txt_path: String,
    pub pdf_sha256: String,
}
