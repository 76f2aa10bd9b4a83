//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Blob download constants
pub mod blob {
    /// Maximum time a single blob download may take (10 minutes)
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

    /// Registry key for the public HTTP backend
    pub const HTTP_PUBLIC_BACKEND: &str = "http_public";
}

/// Truss cache directory constants
pub mod cache {
    /// Home-relative root for packaged models (`~/.truss`)
    pub const TRUSS_DIR: &str = ".truss";

    /// Subdirectory holding packaged model directories
    pub const MODELS_DIR: &str = "models";

    /// Length of the random suffix on non-shadow target directories
    pub const RANDOM_SUFFIX_LEN: usize = 6;
}

/// Logging constants
pub mod logging {
    /// Default log level when none is configured
    pub const DEFAULT_LEVEL: &str = "info";
}
