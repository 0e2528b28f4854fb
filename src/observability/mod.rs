//! Observability for polish sessions.
//!
//! Structured logging through `tracing`, credential redaction for log
//! output, and session metrics.

mod logging;
mod metrics;

pub use logging::{redact, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{
    DefaultMetricsCollector, MetricsCollector, NoopMetricsCollector, SessionMetrics,
    SessionOutcome,
};
