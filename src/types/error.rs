//! Unified Error Type System
//!
//! Centralized error types for the entire crate.
//!
//! ## Design Principles
//!
//! - Single unified error type (TrussError) for the entire crate
//! - Structured error variants with context for better debugging
//! - Absence of a schema contract is NOT an error: inference returns `Option`,
//!   never `Err` (see [`crate::schema`])
//! - No panic/unwrap outside tests - all errors are propagated

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum TrussError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Filesystem Errors
    // -------------------------------------------------------------------------
    /// Symlink traversal is fatal: recursive copy/remove/mtime walks refuse
    /// to follow links to avoid loop and escape hazards.
    #[error("symlinks not allowed in truss directory: {0}")]
    SymlinkNotAllowed(PathBuf),

    /// Raised when a tree operation expects a directory and finds none.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Home or cache directory could not be resolved for this platform.
    #[error("cannot resolve {0} directory")]
    UnresolvedDirectory(&'static str),

    // -------------------------------------------------------------------------
    // Blob Errors
    // -------------------------------------------------------------------------
    /// Non-2xx response while downloading a blob. Fatal, never retried.
    #[error("blob download failed with status {status}: {url}")]
    BlobStatus { status: u16, url: String },

    /// Backend name not present in the registry.
    #[error("unknown blob backend: {0}")]
    UnknownBackend(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),
}

impl TrussError {
    /// Create a config error from any displayable cause.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a blob status error from a response status and URL.
    pub fn blob_status(status: u16, url: impl Into<String>) -> Self {
        Self::BlobStatus {
            status,
            url: url.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrussError>;
