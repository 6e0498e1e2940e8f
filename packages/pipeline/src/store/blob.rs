use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::BlobStore;
use crate::error::{PipelineError, Result};

/// Blob store writing under a local root directory.
///
/// Returned URLs use the configured public base URL when set, `file://`
/// otherwise.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    pub fn with_public_base_url(mut self, base_url: Option<String>) -> Self {
        self.public_base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative blob path, rejecting anything that leaves the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(PipelineError::InvalidInput(format!(
                "invalid blob path: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }

    fn url_for(&self, path: &str, full_path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{base}/{path}"),
            None => format!("file://{}", full_path.display()),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_blob(&self, bytes: &[u8], path: &str, content_type: &str) -> Result<String> {
        let full_path = self.resolve(path)?;
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        tracing::debug!(path = %full_path.display(), "blob written");
        Ok(self.url_for(path, &full_path))
    }
}
