//! Blob Download Backends
//!
//! Defines the BlobBackend trait for fetching remote model artifacts to
//! local paths, and a registry resolving backends by name.
//!
//! Backends stream to disk - the payload is never buffered in memory - and
//! surface any non-success HTTP status as a fatal error with no retry.

mod http_public;

pub use http_public::HttpPublicBackend;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::constants::blob::HTTP_PUBLIC_BACKEND;
use crate::types::{Result, TrussError};

// =============================================================================
// Blob Backend Trait
// =============================================================================

/// A backend that can materialize a remote object at a local path.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Download `url` to `download_to`. The only side effect is the written
    /// file; failures surface as errors, never partial silent success.
    async fn download(&self, url: &str, download_to: &Path) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Shared backend handle stored in the registry.
pub type SharedBackend = Arc<dyn BlobBackend>;

// =============================================================================
// Backend Registry
// =============================================================================

/// Name-keyed registry of blob backends.
pub struct BlobBackendRegistry {
    backends: DashMap<String, SharedBackend>,
}

impl BlobBackendRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            backends: DashMap::new(),
        }
    }

    /// Registry with the public HTTP backend pre-registered under
    /// [`HTTP_PUBLIC_BACKEND`].
    pub fn with_defaults() -> Result<Self> {
        let registry = Self::new();
        registry.register(HTTP_PUBLIC_BACKEND, Arc::new(HttpPublicBackend::new()?));
        Ok(registry)
    }

    /// Register a backend under a name, replacing any previous registration.
    pub fn register(&self, name: &str, backend: SharedBackend) {
        self.backends.insert(name.to_string(), backend);
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<SharedBackend> {
        self.backends.get(name).map(|entry| entry.value().clone())
    }

    /// Resolve a backend and download through it.
    pub async fn download(&self, backend: &str, url: &str, download_to: &Path) -> Result<()> {
        let backend = self
            .get(backend)
            .ok_or_else(|| TrussError::UnknownBackend(backend.to_string()))?;
        backend.download(url, download_to).await
    }
}

impl Default for BlobBackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
