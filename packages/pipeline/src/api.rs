//! HTTP surface for triggering crawls and inspecting jobs.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use regwatch_harvester::config::DEFAULT_RATE;
use regwatch_harvester::{scrape_regulation, Fetcher, RateLimited, RegulationRecord};

use crate::crawl::Crawler;
use crate::error::PipelineError;
use crate::models::{CrawlJob, CrawlParameters, JobStatus, NewCrawlJob};

const DEFAULT_PAGE_LIMIT: u32 = 20;
const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct AppState {
    pub crawler: Arc<Crawler>,
    /// Unthrottled fetcher for single-page ingestion.
    pub fetcher: Arc<dyn Fetcher>,
    /// Cancelled on shutdown; running crawls observe a child token.
    pub shutdown: CancellationToken,
}

/// JSON error response.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::JobNotFound(_) => Self::NotFound(e.to_string()),
            PipelineError::InvalidInput(m) => Self::BadRequest(m),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::Internal(other.to_string())
            }
        }
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/crawl", post(start_crawl))
        .route("/api/crawl/jobs", get(list_jobs))
        .route("/api/crawl/jobs/{id}", get(get_job))
        .route("/api/ingest", get(ingest))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CrawlRequest {
    pub max_items: Option<u32>,
    pub years: Option<Vec<i32>>,
    pub jenis_ids: Option<Vec<u32>>,
    pub created_by: Option<String>,
    pub rate: Option<f64>,
}

impl CrawlRequest {
    /// Validate and fill defaults.
    pub fn into_job(self) -> Result<NewCrawlJob, ApiError> {
        let created_by = self
            .created_by
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::BadRequest("created_by is required".into()))?;

        let mut parameters = CrawlParameters::default()
            .with_years(self.years.unwrap_or_default())
            .with_jenis_ids(self.jenis_ids.unwrap_or_default())
            .with_rate(self.rate.unwrap_or(DEFAULT_RATE));
        if let Some(max_items) = self.max_items {
            parameters = parameters.with_max_items(max_items);
        }

        Ok(NewCrawlJob::new(created_by, parameters))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub items_crawled: i32,
    pub items_skipped: i32,
}

/// Run a crawl and respond when it finishes.
///
/// The crawl runs on its own task so a dropped connection does not abandon
/// the job half-way.
async fn start_crawl(
    State(state): State<AppState>,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<CrawlSummary>, ApiError> {
    let job = request.into_job()?;
    let crawler = Arc::clone(&state.crawler);
    let cancel = state.shutdown.child_token();

    let job = tokio::spawn(async move { crawler.run(job, cancel).await })
        .await
        .map_err(|e| ApiError::Internal(format!("crawl task failed: {e}")))??;

    Ok(Json(CrawlSummary {
        job_id: job.id,
        status: job.status,
        items_crawled: job.items_crawled,
        items_skipped: job.items_skipped,
    }))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CrawlJob>, ApiError> {
    let job = state.crawler.jobs().get_job(id).await?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<CrawlJob>,
    pub page: u32,
    pub limit: u32,
}

async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<JobList>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let jobs = state.crawler.jobs().list_jobs(page, limit).await?;
    Ok(Json(JobList { jobs, page, limit }))
}

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub url: Option<String>,
}

/// Extract one detail page without persisting anything.
async fn ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestQuery>,
) -> Result<Json<RegulationRecord>, ApiError> {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("url is required".into()))?;
    url::Url::parse(&url).map_err(|e| ApiError::BadRequest(format!("invalid url: {e}")))?;

    // shares the crawler's throttle so ingestion never overlaps a crawl request
    let fetcher = RateLimited::new(Arc::clone(&state.fetcher), DEFAULT_RATE)
        .with_throttle(state.crawler.throttle().clone());
    let record = scrape_regulation(&fetcher, &url).await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "ingest failed");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(record))
}
