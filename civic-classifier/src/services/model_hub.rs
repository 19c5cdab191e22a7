//! Pretrained model retrieval
//!
//! Resolves the configured [`ModelSource`] to a local file. Hub models are
//! downloaded once into a per-repository cache directory and reused on
//! later starts:
//!
//! `<cache_dir>/<org>--<name>/<revision>/<file>`
//!
//! Downloads stream into a temporary file that is renamed into place only
//! when complete, so an interrupted download never leaves a truncated
//! model in the cache. A download that receives no data for the stall
//! timeout is abandoned.

use civic_common::config::ModelSource;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ModelHubError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("model download failed: {0}")]
    Network(String),

    #[error("model download from {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("model download from {url} stalled for {after:?}")]
    Stalled { url: String, after: Duration },

    #[error("model cache error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download URL for a file in a hub repository
pub fn download_url(hub_url: &str, repo: &str, revision: &str, file: &str) -> String {
    format!(
        "{}/{}/resolve/{}/{}",
        hub_url.trim_end_matches('/'),
        repo,
        revision,
        file
    )
}

/// Cache location for a file in a hub repository
pub fn cached_model_path(cache_dir: &Path, repo: &str, revision: &str, file: &str) -> PathBuf {
    cache_dir
        .join(repo.replace('/', "--"))
        .join(revision)
        .join(file)
}

pub struct ModelHub {
    http_client: Client,
    token: Option<String>,
    stall_timeout: Duration,
}

impl ModelHub {
    pub fn new(token: Option<String>, stall_timeout: Duration) -> Result<Self, ModelHubError> {
        let http_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(stall_timeout))
            .build()
            .map_err(|e| ModelHubError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            token,
            stall_timeout,
        })
    }

    fn stalled(&self, url: &str) -> ModelHubError {
        ModelHubError::Stalled {
            url: url.to_string(),
            after: self.stall_timeout,
        }
    }

    /// Resolve `source` to a local model file, downloading if needed
    pub async fn resolve(&self, source: &ModelSource) -> Result<PathBuf, ModelHubError> {
        match source {
            ModelSource::LocalPath(path) => {
                if path.exists() {
                    Ok(path.clone())
                } else {
                    Err(ModelHubError::NotFound(path.clone()))
                }
            }
            ModelSource::Hub {
                hub_url,
                repo,
                revision,
                file,
                cache_dir,
            } => {
                let target = cached_model_path(cache_dir, repo, revision, file);
                if target.exists() {
                    debug!(path = %target.display(), "Using cached model");
                    return Ok(target);
                }

                let url = download_url(hub_url, repo, revision, file);
                self.download(&url, &target).await?;
                Ok(target)
            }
        }
    }

    async fn download(&self, url: &str, target: &Path) -> Result<(), ModelHubError> {
        info!(%url, "Downloading model");

        let mut request = self.http_client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let mut response = timeout(self.stall_timeout, request.send())
            .await
            .map_err(|_| self.stalled(url))?
            .map_err(|e| ModelHubError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelHubError::Status {
                url: url.to_string(),
                status,
            });
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = target.with_extension("partial");
        let size_bytes = match self.stream_to_file(&mut response, url, &partial).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    warn!(path = %partial.display(), "Failed to remove partial download: {}", cleanup);
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, target).await?;

        info!(path = %target.display(), size_bytes, "Model cached");
        Ok(())
    }

    /// Write the response body to `path` chunk by chunk, returning its size
    async fn stream_to_file(
        &self,
        response: &mut Response,
        url: &str,
        path: &Path,
    ) -> Result<u64, ModelHubError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;

        while let Some(chunk) = timeout(self.stall_timeout, response.chunk())
            .await
            .map_err(|_| self.stalled(url))?
            .map_err(|e| ModelHubError::Network(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}
