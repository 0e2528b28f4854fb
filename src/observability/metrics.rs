//! Metrics collection for polish sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// The stream finished and the response was parsed.
    Completed,
    /// The request or stream failed.
    Failed,
    /// The user stopped the session.
    Cancelled,
}

/// Metrics collector interface.
pub trait MetricsCollector: Send + Sync {
    /// Records a session start.
    fn record_session_started(&self, mode: &str);

    /// Records a session end and how long it ran.
    fn record_session_finished(&self, outcome: SessionOutcome, duration: Duration);

    /// Records one applied delta.
    fn record_delta(&self, chars: usize);

    /// Records an error by kind.
    fn record_error(&self, error_kind: &str);

    /// Gets current metrics.
    fn get_metrics(&self) -> SessionMetrics;

    /// Resets all metrics.
    fn reset(&self);
}

/// Session metrics snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMetrics {
    /// Sessions started.
    pub sessions_started: u64,
    /// Sessions that completed.
    pub sessions_completed: u64,
    /// Sessions that failed.
    pub sessions_failed: u64,
    /// Sessions that were cancelled.
    pub sessions_cancelled: u64,
    /// Total run time of finished sessions in milliseconds.
    pub total_duration_ms: u64,
    /// Deltas applied.
    pub deltas: u64,
    /// Characters streamed.
    pub streamed_chars: u64,
    /// Sessions started per mode.
    pub modes: HashMap<String, u64>,
    /// Error counts by kind.
    pub errors: HashMap<String, u64>,
}

impl SessionMetrics {
    /// Sessions that reached a terminal status.
    pub fn finished_sessions(&self) -> u64 {
        self.sessions_completed + self.sessions_failed + self.sessions_cancelled
    }

    /// Average run time of finished sessions in milliseconds.
    pub fn average_duration_ms(&self) -> f64 {
        let finished = self.finished_sessions();
        if finished == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / finished as f64
        }
    }

    /// Completion rate over finished sessions as a percentage.
    pub fn completion_rate(&self) -> f64 {
        let finished = self.finished_sessions();
        if finished == 0 {
            100.0
        } else {
            (self.sessions_completed as f64 / finished as f64) * 100.0
        }
    }
}

/// Default metrics collector implementation.
pub struct DefaultMetricsCollector {
    sessions_started: AtomicU64,
    sessions_completed: AtomicU64,
    sessions_failed: AtomicU64,
    sessions_cancelled: AtomicU64,
    total_duration_ms: AtomicU64,
    deltas: AtomicU64,
    streamed_chars: AtomicU64,
    modes: RwLock<HashMap<String, u64>>,
    errors: RwLock<HashMap<String, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            sessions_failed: AtomicU64::new(0),
            sessions_cancelled: AtomicU64::new(0),
            total_duration_ms: AtomicU64::new(0),
            deltas: AtomicU64::new(0),
            streamed_chars: AtomicU64::new(0),
            modes: RwLock::new(HashMap::new()),
            errors: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for DefaultMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_session_started(&self, mode: &str) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut modes) = self.modes.write() {
            *modes.entry(mode.to_string()).or_insert(0) += 1;
        }
    }

    fn record_session_finished(&self, outcome: SessionOutcome, duration: Duration) {
        let counter = match outcome {
            SessionOutcome::Completed => &self.sessions_completed,
            SessionOutcome::Failed => &self.sessions_failed,
            SessionOutcome::Cancelled => &self.sessions_cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.total_duration_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    fn record_delta(&self, chars: usize) {
        self.deltas.fetch_add(1, Ordering::Relaxed);
        self.streamed_chars.fetch_add(chars as u64, Ordering::Relaxed);
    }

    fn record_error(&self, error_kind: &str) {
        if let Ok(mut errors) = self.errors.write() {
            *errors.entry(error_kind.to_string()).or_insert(0) += 1;
        }
    }

    fn get_metrics(&self) -> SessionMetrics {
        SessionMetrics {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            sessions_failed: self.sessions_failed.load(Ordering::Relaxed),
            sessions_cancelled: self.sessions_cancelled.load(Ordering::Relaxed),
            total_duration_ms: self.total_duration_ms.load(Ordering::Relaxed),
            deltas: self.deltas.load(Ordering::Relaxed),
            streamed_chars: self.streamed_chars.load(Ordering::Relaxed),
            modes: self.modes.read().map(|m| m.clone()).unwrap_or_default(),
            errors: self.errors.read().map(|e| e.clone()).unwrap_or_default(),
        }
    }

    fn reset(&self) {
        self.sessions_started.store(0, Ordering::Relaxed);
        self.sessions_completed.store(0, Ordering::Relaxed);
        self.sessions_failed.store(0, Ordering::Relaxed);
        self.sessions_cancelled.store(0, Ordering::Relaxed);
        self.total_duration_ms.store(0, Ordering::Relaxed);
        self.deltas.store(0, Ordering::Relaxed);
        self.streamed_chars.store(0, Ordering::Relaxed);

        if let Ok(mut modes) = self.modes.write() {
            modes.clear();
        }
        if let Ok(mut errors) = self.errors.write() {
            errors.clear();
        }
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("sessions_started", &self.sessions_started.load(Ordering::Relaxed))
            .field(
                "sessions_completed",
                &self.sessions_completed.load(Ordering::Relaxed),
            )
            .field("sessions_failed", &self.sessions_failed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Collector that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn record_session_started(&self, _mode: &str) {}
    fn record_session_finished(&self, _outcome: SessionOutcome, _duration: Duration) {}
    fn record_delta(&self, _chars: usize) {}
    fn record_error(&self, _error_kind: &str) {}

    fn get_metrics(&self) -> SessionMetrics {
        SessionMetrics::default()
    }

    fn reset(&self) {}
}
