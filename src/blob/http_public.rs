//! Public HTTP Blob Backend
//!
//! Streams a remote object to a local path chunk by chunk, keeping memory
//! usage flat regardless of payload size. Redirects are followed; any
//! non-success status is fatal and propagated with no retry.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::BlobBackend;
use crate::constants::blob::DOWNLOAD_TIMEOUT_SECS;
use crate::types::{Result, TrussError};

/// Backend for publicly reachable HTTP(S) objects.
pub struct HttpPublicBackend {
    client: reqwest::Client,
}

impl HttpPublicBackend {
    /// Backend with the standard 10 minute download timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
    }

    /// Backend with a caller-chosen timeout covering the whole transfer.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Only http/https URLs are accepted; anything else is a config error.
    fn validate_url(url: &str) -> Result<()> {
        let parsed = url::Url::parse(url)
            .map_err(|e| TrussError::config(format!("invalid blob URL '{}': {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TrussError::config(format!(
                "blob URL must use http or https scheme, got: {}",
                parsed.scheme()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobBackend for HttpPublicBackend {
    async fn download(&self, url: &str, download_to: &Path) -> Result<()> {
        Self::validate_url(url)?;

        debug!("Downloading blob from {} to {}", url, download_to.display());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrussError::blob_status(status.as_u16(), url));
        }

        let mut file = tokio::fs::File::create(download_to).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Downloaded {} bytes to {}", written, download_to.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "http_public"
    }
}
