//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/truss/config.toml)
//! 3. Environment variables (TRUSS_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::TrussConfig;
use crate::types::{Result, TrussError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global file → env vars
    pub fn load() -> Result<TrussConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(TrussConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        // Merge environment variables (e.g., TRUSS_LOGGING_LEVEL -> logging.level)
        figment = figment.merge(Env::prefixed("TRUSS_").split('_').lowercase(true));

        let config: TrussConfig = figment
            .extract()
            .map_err(|e| TrussError::config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<TrussConfig> {
        let config: TrussConfig = Figment::new()
            .merge(Serialized::defaults(TrussConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| TrussError::config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to the global config directory (~/.config/truss/)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|base| base.config_dir().join("truss"))
    }

    /// Get path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the global config directory and a default config file.
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir =
            Self::global_dir().ok_or(TrussError::UnresolvedDirectory("config"))?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(global_dir)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# Truss Global Configuration
# User-wide defaults. Environment variables (TRUSS_*) override these.

version = "1.0"

# Packaged-model cache
[cache]
# models_dir = "/path/to/models"

# Blob downloads
[blob]
download_timeout_secs = 600

# Logging
[logging]
level = "info"
"#
        .to_string()
    }
}
