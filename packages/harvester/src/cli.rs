//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::config::{HarvesterConfig, DEFAULT_RATE};
use crate::error::{HarvesterError, Result};
use crate::harvester::{download_regulation, scrape_regulation};
use crate::http::{HttpFetcher, RateLimited};
use crate::pdf::PdfExtractor;
use crate::search::{SearchPages, SearchQuery};

/// Regwatch Harvester - Crawl Indonesian regulations from peraturan.bpk.go.id.
#[derive(Parser)]
#[command(name = "regwatch-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract one regulation detail page and print it as YAML.
    Fetch {
        /// Detail page URL (e.g., https://peraturan.bpk.go.id/Details/123/uu-no-5-tahun-2020)
        url: String,

        /// Requests per second
        #[arg(short, long, default_value_t = DEFAULT_RATE)]
        rate: f64,

        /// Also save the PDF and its markdown under this directory
        #[arg(short, long)]
        download: Option<PathBuf>,
    },

    /// List detail page URLs from the search results.
    Search {
        /// Stop after this many URLs
        #[arg(short, long, default_value_t = 10)]
        max_items: usize,

        /// Year filter, repeatable (default: 2025, 2024, 2023)
        #[arg(short, long = "year")]
        years: Vec<i32>,

        /// Portal category id, repeatable (default: 8, 10, 11, 19)
        #[arg(short, long = "jenis-id")]
        jenis_ids: Vec<u32>,

        /// Requests per second
        #[arg(short, long, default_value_t = DEFAULT_RATE)]
        rate: f64,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = HarvesterConfig::from_env();

    match cli.command {
        Commands::Fetch {
            url,
            rate,
            download,
        } => fetch_command(&config, &url, rate, download.as_deref()).await,
        Commands::Search {
            max_items,
            years,
            jenis_ids,
            rate,
        } => search_command(&config, search_query(years, jenis_ids), max_items, rate).await,
    }
}

/// Empty filter lists fall back to the defaults.
fn search_query(years: Vec<i32>, jenis_ids: Vec<u32>) -> SearchQuery {
    let defaults = SearchQuery::default();
    SearchQuery {
        years: if years.is_empty() { defaults.years } else { years },
        jenis_ids: if jenis_ids.is_empty() {
            defaults.jenis_ids
        } else {
            jenis_ids
        },
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn rate_limited_fetcher(config: &HarvesterConfig, rate: f64) -> Result<RateLimited> {
    let http = HttpFetcher::new(config)?;
    Ok(RateLimited::new(Arc::new(http), rate))
}

/// Execute the fetch command.
async fn fetch_command(
    config: &HarvesterConfig,
    url: &str,
    rate: f64,
    download: Option<&Path>,
) -> Result<()> {
    Url::parse(url).map_err(|source| HarvesterError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let fetcher = rate_limited_fetcher(config, rate)?;

    let pb = spinner();
    pb.set_message("Fetching detail page...");
    let record = match scrape_regulation(&fetcher, url).await {
        Ok(record) => record,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    match record.natural_key() {
        Some(key) => eprintln!("{} {}", style("Found").green().bold(), style(&key).cyan()),
        None => eprintln!(
            "{} jenis, nomor or tahun not found",
            style("Warning:").yellow().bold()
        ),
    }
    print!("{}", serde_yaml_ng::to_string(&record)?);

    let Some(dir) = download else {
        return Ok(());
    };

    let pb = spinner();
    pb.set_message("Downloading PDF...");
    let saved = download_regulation(&fetcher, Arc::new(PdfExtractor), &record, dir).await;
    pb.finish_and_clear();
    let saved = saved?;

    eprintln!();
    eprintln!(
        "{} {} ({} bytes, sha256 {})",
        style("Saved to:").green().bold(),
        saved.pdf_path.display(),
        saved.pdf_bytes,
        saved.pdf_sha256
    );
    eprintln!(
        "{} {}",
        style("Markdown:").green().bold(),
        saved.md_path.display()
    );

    Ok(())
}

/// Execute the search command.
async fn search_command(
    config: &HarvesterConfig,
    query: SearchQuery,
    max_items: usize,
    rate: f64,
) -> Result<()> {
    let fetcher = rate_limited_fetcher(config, rate)?;
    let mut pages = SearchPages::new(&fetcher, config, query, max_items);

    let pb = spinner();
    pb.set_message("Searching...");
    while let Some(url) = pages.next_url().await {
        pb.suspend(|| println!("{url}"));
        pb.set_message(format!("Searching... {} found", pages.returned()));
    }
    pb.finish_and_clear();

    eprintln!(
        "{} {} detail page(s)",
        style("Found").green().bold(),
        pages.returned()
    );

    Ok(())
}
