use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use regwatch_harvester::{HarvesterConfig, HttpFetcher, PdfExtractor};
use regwatch_pipeline::api::{router, AppState};
use regwatch_pipeline::{
    connect_with_retry, run_migrations, ApiConfig, Crawler, LocalBlobStore, PgStore,
    PipelineConfig,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    let api_config = ApiConfig::from_env();
    let harvester_config = HarvesterConfig::from_env();

    tracing::info!("connecting to database...");
    let pool = match connect_with_retry(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };

    tracing::info!("running database migrations...");
    if let Err(e) = run_migrations(&pool).await {
        tracing::error!(error = %e, "failed to run migrations");
        std::process::exit(1);
    }

    let fetcher = match HttpFetcher::new(&harvester_config) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            tracing::error!(error = %e, "failed to create HTTP client");
            std::process::exit(1);
        }
    };

    let store = Arc::new(PgStore::new(pool));
    let blobs = Arc::new(
        LocalBlobStore::new(&api_config.blob_dir)
            .with_public_base_url(api_config.blob_public_base_url.clone()),
    );
    let crawler = Crawler::new(
        fetcher.clone(),
        Arc::new(PdfExtractor),
        store.clone(),
        blobs,
        store,
    )
    .with_config(harvester_config);

    let shutdown = CancellationToken::new();
    let state = AppState {
        crawler: Arc::new(crawler),
        fetcher,
        shutdown: shutdown.clone(),
    };
    let app = router(state, &api_config.allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], api_config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind on {addr}");
            std::process::exit(1);
        }
    };
    tracing::info!(blob_dir = %api_config.blob_dir.display(), "listening on {addr}");

    let signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutting down");
        shutdown.cancel();
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
