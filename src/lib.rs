//! Truss - Model Packaging and Local-Serving Core
//!
//! Wraps arbitrary machine-learning models into a standardized deployable
//! unit with an HTTP prediction interface. This crate holds the core pieces
//! the packaging CLI and serving runtime are built on:
//!
//! - **Contract inference**: derive an input/output schema from a model's
//!   predict signature, including streaming vs. synchronous vs. asynchronous
//!   classification, for OpenAPI generation on the served endpoint
//! - **Shadow directories**: deterministic, hash-named cache directories for
//!   packaged models, with symlink-refusing tree copy and staleness checks
//! - **Blob backends**: streaming download of remote model artifacts
//! - **Structured logging**: one JSON object per line, tagged with request id
//!   and lifecycle stage
//!
//! ## Quick Start
//!
//! ```ignore
//! use truss::schema::{Annotation, FieldType, Parameter, RecordType, TrussSchema};
//!
//! let input = RecordType::builder("ModelInput")
//!     .field("prompt", FieldType::String)
//!     .build();
//! let output = RecordType::builder("ModelOutput")
//!     .field("completion", FieldType::String)
//!     .build();
//!
//! let schema = TrussSchema::from_signature(
//!     &[Parameter::new("input", Annotation::Record(input))],
//!     &Annotation::Record(output),
//! )
//! .expect("annotated signature");
//! let openapi_fragment = schema.serialize();
//! ```
//!
//! ## Modules
//!
//! - [`schema`]: predict-signature contract inference
//! - [`util`]: tree copy, shadow-directory naming, staleness
//! - [`blob`]: download backends and registry
//! - [`logging`]: JSON line logging setup
//! - [`config`]: layered configuration loading

pub mod blob;
pub mod config;
pub mod constants;
pub mod logging;
pub mod schema;
pub mod types;
pub mod util;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{ConfigLoader, TrussConfig};

// Error Types
pub use types::error::{Result, TrussError};

// Schema Inference
pub use schema::{Annotation, FieldType, Parameter, RecordType, TrussSchema};

// =============================================================================
// Blob Re-exports
// =============================================================================

pub use blob::{BlobBackend, BlobBackendRegistry, HttpPublicBackend, SharedBackend};

// =============================================================================
// Logging Re-exports
// =============================================================================

pub use logging::{Lifecycle, LogConfig, request_span, setup_logging};
pub use types::RequestId;
