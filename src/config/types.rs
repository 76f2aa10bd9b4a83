//! Configuration Types
//!
//! All configuration structures with sensible defaults. Everything is
//! optional in the file; absent sections fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants;
use crate::logging::LogConfig;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrussConfig {
    /// Configuration version
    pub version: String,

    /// Packaged-model cache settings
    pub cache: CacheConfig,

    /// Blob download settings
    pub blob: BlobConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for TrussConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            cache: CacheConfig::default(),
            blob: BlobConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TrussConfig {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TrussError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.blob.download_timeout_secs == 0 {
            return Err(crate::types::TrussError::config(
                "blob download_timeout_secs must be greater than 0",
            ));
        }

        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(crate::types::TrussError::config(format!(
                "unknown log level '{}', expected one of: {}",
                self.logging.level,
                LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Root directory for packaged model caches, honoring the override.
    pub fn models_root(&self) -> crate::types::Result<PathBuf> {
        match &self.cache.models_dir {
            Some(dir) => Ok(dir.clone()),
            None => crate::util::models_root(),
        }
    }

    /// Logging configuration for [`crate::logging::setup_logging`].
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.logging.level.clone(),
        }
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Override for the packaged-model root (default: `~/.truss/models`)
    pub models_dir: Option<PathBuf>,
}

// =============================================================================
// Blob Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Whole-transfer timeout for a single download
    pub download_timeout_secs: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: constants::blob::DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: constants::logging::DEFAULT_LEVEL.to_string(),
        }
    }
}
