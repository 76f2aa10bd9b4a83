//! Structured JSON Logging
//!
//! Process-wide logging setup emitting one JSON object per line with the
//! fields `asctime`, `message`, `levelname`, `request_id`, `lifecycle`.
//!
//! Request-id and lifecycle tags are carried on spans (see [`request_span`])
//! and resolved from the event's span scope, innermost value winning; records
//! logged outside any tagged span carry `null` for both.
//!
//! Configuration is an explicit [`LogConfig`] passed to [`setup_logging`] at
//! process startup - there is no ambient stream replacement. Setup is
//! idempotent: repeated calls within one process install exactly one
//! subscriber and never fail.

use std::fmt;
use std::io::Write as _;
use std::sync::OnceLock;

use chrono::Local;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber, span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::constants::logging::DEFAULT_LEVEL;
use crate::types::RequestId;

// =============================================================================
// Lifecycle Tags
// =============================================================================

/// Lifecycle stage a log record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    #[serde(rename = "MODEL_LOAD")]
    Load,
    #[serde(rename = "MODEL_STARTUP")]
    Startup,
    #[serde(rename = "REQUEST")]
    Request,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "MODEL_LOAD",
            Self::Startup => "MODEL_STARTUP",
            Self::Request => "REQUEST",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Logging configuration, passed explicitly at initialization.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
        }
    }
}

// =============================================================================
// Setup
// =============================================================================

static INIT: OnceLock<()> = OnceLock::new();

/// Install the process-wide JSON subscriber.
///
/// Idempotent: only the first call installs anything; later calls (or a
/// subscriber installed elsewhere) turn this into a no-op rather than an
/// error.
pub fn setup_logging(config: &LogConfig) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(JsonLineLayer::stdout())
            .try_init();
    });
}

/// Span carrying the request id and lifecycle tags for everything logged
/// inside it.
pub fn request_span(request_id: &RequestId, lifecycle: Lifecycle) -> tracing::Span {
    tracing::info_span!(
        "request",
        request_id = %request_id,
        lifecycle = %lifecycle,
    )
}

/// Span tagging a non-request lifecycle stage (model load, server startup).
pub fn lifecycle_span(lifecycle: Lifecycle) -> tracing::Span {
    tracing::info_span!("lifecycle", lifecycle = %lifecycle)
}

// =============================================================================
// JSON Line Layer
// =============================================================================

/// Span fields recognized by the layer.
const REQUEST_ID_FIELD: &str = "request_id";
const LIFECYCLE_FIELD: &str = "lifecycle";

/// Tags recorded on a span, stored in its extensions.
#[derive(Debug, Default, Clone)]
struct RequestTags {
    request_id: Option<String>,
    lifecycle: Option<String>,
}

impl RequestTags {
    fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.lifecycle.is_none()
    }
}

/// Layer emitting one JSON object per log record.
pub struct JsonLineLayer<W> {
    make_writer: W,
}

impl JsonLineLayer<fn() -> std::io::Stdout> {
    /// Layer writing to standard output.
    pub fn stdout() -> Self {
        Self {
            make_writer: std::io::stdout,
        }
    }
}

impl<W> JsonLineLayer<W> {
    /// Layer writing through a custom writer, for tests and capture.
    pub fn with_writer(make_writer: W) -> Self {
        Self { make_writer }
    }
}

impl<S, W> Layer<S> for JsonLineLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let mut tags = RequestTags::default();
        attrs.record(&mut TagVisitor(&mut tags));

        if !tags.is_empty()
            && let Some(span) = ctx.span(id)
        {
            span.extensions_mut().insert(tags);
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        if let Some(tags) = extensions.get_mut::<RequestTags>() {
            values.record(&mut TagVisitor(tags));
        } else {
            let mut tags = RequestTags::default();
            values.record(&mut TagVisitor(&mut tags));
            if !tags.is_empty() {
                extensions.insert(tags);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));

        // Innermost span wins for both tags
        let mut request_id = None;
        let mut lifecycle = None;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(tags) = span.extensions().get::<RequestTags>() {
                    if request_id.is_none() {
                        request_id = tags.request_id.clone();
                    }
                    if lifecycle.is_none() {
                        lifecycle = tags.lifecycle.clone();
                    }
                }
                if request_id.is_some() && lifecycle.is_some() {
                    break;
                }
            }
        }

        let record = serde_json::json!({
            "asctime": Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string(),
            "message": message,
            "levelname": event.metadata().level().to_string(),
            "request_id": request_id,
            "lifecycle": lifecycle,
        });

        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{}", record);
    }
}

/// Captures `request_id` / `lifecycle` span fields.
struct TagVisitor<'a>(&'a mut RequestTags);

impl Visit for TagVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            REQUEST_ID_FIELD => self.0.request_id = Some(value.to_string()),
            LIFECYCLE_FIELD => self.0.lifecycle = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if matches!(field.name(), REQUEST_ID_FIELD | LIFECYCLE_FIELD) {
            let rendered = format!("{:?}", value);
            self.record_str(field, rendered.trim_matches('"'));
        }
    }
}

/// Captures the event's `message` field.
struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            use fmt::Write;
            let _ = write!(self.0, "{:?}", value);
        }
    }
}
