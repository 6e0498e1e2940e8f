//! Search-result pagination.
//!
//! [`SearchPages`] turns a filter set into a lazy sequence of detail page
//! URLs, fetching one search page at a time as URLs are pulled.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::{HarvesterConfig, DEFAULT_JENIS_IDS, DEFAULT_YEARS};
use crate::html::{resolve_url, selector};
use crate::http::Fetcher;

static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DETAIL_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/Details/\d+/").expect("valid regex"));

/// Search filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub years: Vec<i32>,

    /// Portal category ids (`jenis`).
    pub jenis_ids: Vec<u32>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS.to_vec(),
            jenis_ids: DEFAULT_JENIS_IDS.to_vec(),
        }
    }
}

/// Build the URL of one search results page.
///
/// # Examples
/// ```
/// use regwatch_harvester::search::{build_search_url, SearchQuery};
///
/// let query = SearchQuery { years: vec![2024], jenis_ids: vec![8, 10] };
/// assert_eq!(
///     build_search_url("https://peraturan.bpk.go.id/Search", &query, 2),
///     "https://peraturan.bpk.go.id/Search?keywords=&tentang=&nomor=&tahun=2024&jenis=8&jenis=10&page=2"
/// );
/// ```
pub fn build_search_url(search_url: &str, query: &SearchQuery, page: u32) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("keywords", "");
    params.append_pair("tentang", "");
    params.append_pair("nomor", "");
    for year in &query.years {
        params.append_pair("tahun", &year.to_string());
    }
    for jenis in &query.jenis_ids {
        params.append_pair("jenis", &jenis.to_string());
    }
    if page > 1 {
        params.append_pair("page", &page.to_string());
    }
    format!("{search_url}?{}", params.finish())
}

/// Detail page links on a search results page, absolute and de-duplicated
/// in page order.
pub fn extract_detail_links(html: &str, base_url: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();

    doc.select(&ANY_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| DETAIL_HREF.is_match(href))
        .filter_map(|href| resolve_url(base_url, href))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Pull-based cursor over detail URLs from consecutive search pages.
///
/// Stops on a page without detail links, on a failed fetch (logged, not
/// retried) or once `max_items` URLs have been returned. Restarting means
/// constructing a new cursor.
pub struct SearchPages<'a> {
    fetcher: &'a dyn Fetcher,
    search_url: String,
    base_url: String,
    query: SearchQuery,
    max_items: usize,
    page: u32,
    returned: usize,
    pending: VecDeque<String>,
    exhausted: bool,
}

impl<'a> SearchPages<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        config: &HarvesterConfig,
        query: SearchQuery,
        max_items: usize,
    ) -> Self {
        Self {
            fetcher,
            search_url: config.search_url(),
            base_url: config.base_url.clone(),
            query,
            max_items,
            page: 1,
            returned: 0,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Number of URLs returned so far.
    #[must_use]
    pub fn returned(&self) -> usize {
        self.returned
    }

    /// Next detail URL, fetching the next search page when needed.
    pub async fn next_url(&mut self) -> Option<String> {
        loop {
            if self.returned >= self.max_items {
                return None;
            }
            if let Some(url) = self.pending.pop_front() {
                self.returned += 1;
                return Some(url);
            }
            if self.exhausted {
                return None;
            }
            self.load_page().await;
        }
    }

    /// Drain the cursor into a list.
    pub async fn collect(mut self) -> Vec<String> {
        let mut urls = Vec::new();
        while let Some(url) = self.next_url().await {
            urls.push(url);
        }
        urls
    }

    async fn load_page(&mut self) {
        let url = build_search_url(&self.search_url, &self.query, self.page);
        tracing::debug!(page = self.page, url = %url, "Fetching search page");

        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(page = self.page, error = %e, "Failed to fetch search page");
                self.exhausted = true;
                return;
            }
        };

        let links = extract_detail_links(&html, &self.base_url);
        if links.is_empty() {
            tracing::info!(page = self.page, "Search page has no results");
            self.exhausted = true;
            return;
        }

        tracing::debug!(page = self.page, count = links.len(), "Search page parsed");
        self.pending.extend(links);
        self.page += 1;
    }
}
