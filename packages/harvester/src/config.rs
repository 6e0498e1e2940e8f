//! Configuration constants and the explicit HTTP configuration object.

use std::time::Duration;

use sha2::{Digest, Sha256};

/// Base URL of the BPK regulation portal.
pub const BPK_BASE_URL: &str = "https://peraturan.bpk.go.id";

/// Timeout for detail and search page fetches, in seconds.
pub const PAGE_TIMEOUT_SECS: u64 = 45;

/// Timeout for PDF downloads, in seconds.
///
/// PDFs of large statutes run to tens of megabytes.
pub const PDF_TIMEOUT_SECS: u64 = 90;

/// Default request rate in requests per second.
pub const DEFAULT_RATE: f64 = 1.5;

/// Lowest rate honoured by the rate limiter.
pub const MIN_RATE: f64 = 0.1;

/// Shortest delay enforced before any request.
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// Default years for the search filter.
pub const DEFAULT_YEARS: [i32; 3] = [2025, 2024, 2023];

/// Default category ids: UU, PP, Perpres, Permen.
pub const DEFAULT_JENIS_IDS: [u32; 4] = [8, 10, 11, 19];

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("regwatch-harvester/", env!("CARGO_PKG_VERSION"));

/// HTTP configuration passed explicitly into the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvesterConfig {
    /// Portal base URL, used to build search URLs and resolve relative links.
    pub base_url: String,
    pub user_agent: String,
    pub page_timeout: Duration,
    pub pdf_timeout: Duration,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            base_url: BPK_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            page_timeout: Duration::from_secs(PAGE_TIMEOUT_SECS),
            pdf_timeout: Duration::from_secs(PDF_TIMEOUT_SECS),
        }
    }
}

impl HarvesterConfig {
    /// Read overrides from the environment (`BPK_BASE_URL`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("BPK_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// URL of the search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/Search", self.base_url.trim_end_matches('/'))
    }
}

/// Delay to wait before each request at the given rate.
///
/// The rate is floored at [`MIN_RATE`] and the delay at [`MIN_DELAY`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use regwatch_harvester::config::delay_for_rate;
///
/// assert_eq!(delay_for_rate(2.0), Duration::from_millis(500));
/// assert_eq!(delay_for_rate(0.0), Duration::from_secs(10));
/// ```
pub fn delay_for_rate(rate_per_sec: f64) -> Duration {
    let rate = if rate_per_sec.is_nan() {
        MIN_RATE
    } else {
        rate_per_sec.max(MIN_RATE)
    };
    Duration::from_secs_f64(1.0 / rate).max(MIN_DELAY)
}

/// Make a regulation number safe for use as a file name.
///
/// # Examples
/// ```
/// use regwatch_harvester::config::sanitize_nomor;
///
/// assert_eq!(sanitize_nomor("5"), "5");
/// assert_eq!(sanitize_nomor("12/PMK.03/2024"), "12-pmk-03-2024");
/// assert_eq!(sanitize_nomor("///"), "unknown");
/// ```
pub fn sanitize_nomor(nomor: &str) -> String {
    let mut slug = String::with_capacity(nomor.len());
    let mut pending_dash = false;
    for c in nomor.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// File stem for a regulation number.
///
/// The slug from [`sanitize_nomor`], followed by the first 8 hex digits of
/// the raw number's SHA-256 whenever slugging changed it, so distinct numbers
/// never share a file.
///
/// # Examples
/// ```
/// use regwatch_harvester::config::nomor_file_stem;
///
/// assert_eq!(nomor_file_stem("5"), "5");
/// assert_eq!(nomor_file_stem("5A"), "5a-1e0bfb03");
/// assert_eq!(nomor_file_stem("12/PMK.03/2024"), "12-pmk-03-2024-cc94839d");
/// ```
pub fn nomor_file_stem(nomor: &str) -> String {
    let slug = sanitize_nomor(nomor);
    if slug == nomor {
        return slug;
    }
    let digest = format!("{:x}", Sha256::digest(nomor.as_bytes()));
    format!("{slug}-{}", &digest[..8])
}
