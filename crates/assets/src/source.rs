//! Asset retrieval abstraction.

use std::path::PathBuf;

use async_trait::async_trait;
use aq_common::{AqError, AqResult};
use bytes::Bytes;
use tracing::debug;

/// Retrieval seam over the asset tree. Paths are relative, slash-separated,
/// as produced by [`crate::layout`].
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch an asset. Missing assets are `FetchUnavailable`.
    async fn fetch(&self, path: &str) -> AqResult<Bytes>;
}

/// Asset source backed by an HTTP origin.
pub struct HttpAssetSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> AqResult<Bytes> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "fetching asset");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AqError::FetchUnavailable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AqError::FetchUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| AqError::FetchUnavailable(format!("{}: {}", url, e)))
    }
}

/// Asset source backed by a local directory, used by tests and the viewer
/// binary.
pub struct LocalAssetSource {
    root: PathBuf,
}

impl LocalAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetSource for LocalAssetSource {
    async fn fetch(&self, path: &str) -> AqResult<Bytes> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "reading asset");
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AqError::FetchUnavailable(
                full.display().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
