use std::path::PathBuf;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| PipelineError::Config("DATABASE_URL not set".into()))?;

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Settings for the crawl API binary.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    /// Root directory of the local blob store.
    pub blob_dir: PathBuf,
    /// Public URL prefix for stored blobs; `file://` URLs when unset.
    pub blob_public_base_url: Option<String>,
    /// CORS origins; empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            blob_dir: PathBuf::from("./downloads/regulations"),
            blob_public_base_url: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let blob_dir = std::env::var("REG_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.blob_dir);

        let blob_public_base_url = std::env::var("BLOB_PUBLIC_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        Self {
            port,
            blob_dir,
            blob_public_base_url,
            allowed_origins,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_blob_dir(mut self, blob_dir: impl Into<PathBuf>) -> Self {
        self.blob_dir = blob_dir.into();
        self
    }
}

/// Split a comma-separated origin list; `*` alone means any origin.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(String::from)
        .collect()
}
