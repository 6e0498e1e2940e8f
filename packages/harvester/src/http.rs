//! HTTP access to the BPK portal.
//!
//! [`Fetcher`] is the seam between extraction and the network so crawls can
//! be exercised against canned pages. Requests are never retried.
//!
//! Rate limiters that share a [`Throttle`] never have more than one request
//! in flight between them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::{delay_for_rate, HarvesterConfig};
use crate::error::{HarvesterError, Result};

/// Fetches pages and PDFs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch an HTML page as text.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Download a PDF as raw bytes.
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`Fetcher`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    page_timeout: Duration,
    pdf_timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and timeouts.
    pub fn new(config: &HarvesterConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            page_timeout: config.page_timeout,
            pdf_timeout: config.pdf_timeout,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let to_error = |source| HarvesterError::PageFetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(to_error)?;
        response.text().await.map_err(to_error)
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>> {
        let to_error = |source| HarvesterError::PdfDownload {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .timeout(self.pdf_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(to_error)?;
        let bytes = response.bytes().await.map_err(to_error)?;
        Ok(bytes.to_vec())
    }
}

/// Gate shared by every [`RateLimited`] that talks to the same site.
///
/// Cloning shares the gate.
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    gate: Arc<Mutex<()>>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Wraps a [`Fetcher`] and waits a fixed delay before every request.
///
/// The delay is derived from a requests-per-second rate, see
/// [`delay_for_rate`]. The wait and the request both happen while holding
/// the [`Throttle`], so limiters sharing one are serialized.
#[derive(Clone)]
pub struct RateLimited {
    inner: Arc<dyn Fetcher>,
    delay: Duration,
    throttle: Throttle,
}

impl RateLimited {
    /// A limiter with its own throttle.
    pub fn new(inner: Arc<dyn Fetcher>, rate_per_sec: f64) -> Self {
        Self {
            inner,
            delay: delay_for_rate(rate_per_sec),
            throttle: Throttle::new(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Take the throttle and wait out the delay; the request runs under the
    /// returned guard.
    async fn wait(&self, url: &str) -> MutexGuard<'_, ()> {
        let turn = self.throttle.gate.lock().await;
        tracing::debug!(url, delay_ms = self.delay.as_millis() as u64, "Rate limit wait");
        tokio::time::sleep(self.delay).await;
        turn
    }
}

#[async_trait]
impl Fetcher for RateLimited {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let _turn = self.wait(url).await;
        self.inner.fetch_page(url).await
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>> {
        let _turn = self.wait(url).await;
        self.inner.fetch_pdf(url).await
    }
}
