//! Logging and request metrics for Archrest.
//!
//! - **Logging**: structured output through `tracing-subscriber`, JSON or
//!   pretty, filtered by `RUST_LOG` or the configured level
//! - **Metrics**: request counters and latency histograms emitted through the
//!   `metrics` facade; installing an exporter is left to the application
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `archrest_http_requests_total` | Counter | `method`, `route`, `status` |
//! | `archrest_http_request_duration_seconds` | Histogram | `method`, `route` |
//!
//! # Example
//!
//! ```rust,ignore
//! use archrest_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("ready");
//! ```

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use metrics::{describe_metrics, record_request};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
