//! Drives a [`Session`] through one request at a time.

use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::state::{PolishRequest, Session, SessionStatus};
use crate::errors::{PolishError, PolishResult};
use crate::observability::{MetricsCollector, NoopMetricsCollector, SessionOutcome};
use crate::services::PolishService;
use crate::types::history::HistoryRecord;

/// Callback receiving a record for every completed session.
pub type CompletionHook = Arc<dyn Fn(HistoryRecord) + Send + Sync>;

struct Inner {
    session: Session,
    generation: u64,
    cancel: Option<CancellationToken>,
    last_request: Option<PolishRequest>,
    started_at: Option<Instant>,
}

struct Shared {
    service: Arc<PolishService>,
    inner: Mutex<Inner>,
    updates: watch::Sender<Session>,
    metrics: Arc<dyn MetricsCollector>,
    on_complete: Option<CompletionHook>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    /// Publishes the session. Called with the lock held so observers see
    /// snapshots in transition order.
    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.session.clone());
    }

    /// Fires the in-flight token, if any, and accounts for the session it
    /// belonged to.
    fn abort_in_flight(&self, inner: &mut Inner) {
        if let Some(token) = inner.cancel.take() {
            token.cancel();
        }
        if inner.session.is_streaming() {
            self.record_finished(inner, SessionOutcome::Cancelled);
        }
    }

    fn record_finished(&self, inner: &mut Inner, outcome: SessionOutcome) {
        let elapsed = inner
            .started_at
            .take()
            .map(|t| t.elapsed())
            .unwrap_or_default();
        self.metrics.record_session_finished(outcome, elapsed);
    }

    /// Applies `transition` if `generation` is still current and its token
    /// has not fired. Returns whether the session changed.
    fn apply<F>(&self, generation: u64, token: &CancellationToken, transition: F) -> bool
    where
        F: FnOnce(&mut Session) -> bool,
    {
        let mut inner = lock(&self.inner);
        if inner.generation != generation || token.is_cancelled() {
            return false;
        }
        let changed = transition(&mut inner.session);
        if changed {
            self.publish(&inner);
        }
        changed
    }

    fn fail(&self, generation: u64, token: &CancellationToken, error: &PolishError) {
        let message = error.user_message();
        let mut inner = lock(&self.inner);
        if inner.generation != generation || token.is_cancelled() {
            return;
        }
        if inner.session.fail(message) {
            tracing::warn!(error = %error, kind = error.kind(), "Polish session failed");
            inner.cancel = None;
            self.metrics.record_error(error.kind());
            self.record_finished(&mut inner, SessionOutcome::Failed);
            self.publish(&inner);
        }
    }

    fn complete(&self, generation: u64, token: &CancellationToken, provider: &str) {
        let record = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation || token.is_cancelled() {
                return;
            }
            if !inner.session.complete() {
                return;
            }
            inner.cancel = None;
            self.record_finished(&mut inner, SessionOutcome::Completed);
            self.publish(&inner);

            let session = &inner.session;
            tracing::info!(
                mode = %session.mode(),
                changed = session.has_changes(),
                "Polish session completed"
            );
            HistoryRecord::new(
                session.mode(),
                session.original_text(),
                session.final_text(),
                provider,
            )
        };

        if let Some(hook) = &self.on_complete {
            hook(record);
        }
    }
}

async fn drive(
    shared: Arc<Shared>,
    request: PolishRequest,
    token: CancellationToken,
    generation: u64,
) {
    let stream = shared
        .service
        .stream(
            &request.text,
            request.mode,
            &request.config,
            request.instruction.as_deref(),
            token.clone(),
        )
        .await;

    let mut stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            shared.fail(generation, &token, &e);
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(delta) => {
                if !shared.apply(generation, &token, |s| s.push_delta(&delta)) {
                    tracing::debug!("Dropping delta of a superseded session");
                    return;
                }
                shared.metrics.record_delta(delta.chars().count());
            }
            Err(e) => {
                shared.fail(generation, &token, &e);
                return;
            }
        }
    }
    drop(stream);

    shared.complete(generation, &token, &request.config.provider_id);
}

/// Runs polish requests against a single observable [`Session`].
///
/// At most one request is in flight: `start`, `reset` and `cancel` fire the
/// previous request's token under the session lock, and every update from a
/// request is discarded unless it is still the current one. Observers
/// receive snapshots through [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct SessionOrchestrator {
    shared: Arc<Shared>,
}

impl SessionOrchestrator {
    /// Creates an orchestrator with no metrics and no completion hook.
    pub fn new(service: Arc<PolishService>) -> Self {
        Self::builder(service).build()
    }

    /// Creates a builder.
    pub fn builder(service: Arc<PolishService>) -> SessionOrchestratorBuilder {
        SessionOrchestratorBuilder {
            service,
            metrics: None,
            on_complete: None,
        }
    }

    /// Starts a new request, superseding any in-flight one.
    ///
    /// Must be called within a Tokio runtime. When this returns, the
    /// session is Streaming for `request` and no update from an earlier
    /// request will be published. Returns the request's generation.
    pub fn start(&self, request: PolishRequest) -> u64 {
        let (token, generation) = {
            let mut inner = lock(&self.shared.inner);
            self.shared.abort_in_flight(&mut inner);

            inner.generation += 1;
            inner
                .session
                .begin(&request.text, request.mode, request.instruction.clone());
            inner.last_request = Some(request.clone());
            inner.started_at = Some(Instant::now());

            let token = CancellationToken::new();
            inner.cancel = Some(token.clone());
            self.shared.publish(&inner);

            (token, inner.generation)
        };

        self.shared.metrics.record_session_started(request.mode.as_str());

        let span = tracing::info_span!("polish_session", generation, mode = %request.mode);
        tokio::spawn(drive(Arc::clone(&self.shared), request, token, generation).instrument(span));

        generation
    }

    /// Re-runs the last request with identical parameters.
    pub fn retry(&self) -> PolishResult<u64> {
        let request = lock(&self.shared.inner)
            .last_request
            .clone()
            .ok_or_else(|| PolishError::validation("No previous request to retry"))?;
        Ok(self.start(request))
    }

    /// Stops the in-flight request. Returns false if nothing was streaming.
    pub fn cancel(&self) -> bool {
        let mut inner = lock(&self.shared.inner);
        if let Some(token) = inner.cancel.take() {
            token.cancel();
        }
        if !inner.session.cancel() {
            return false;
        }
        tracing::debug!("Polish session cancelled");
        self.shared.record_finished(&mut inner, SessionOutcome::Cancelled);
        self.shared.publish(&inner);
        true
    }

    /// Stops any in-flight request and returns to Idle.
    pub fn reset(&self) {
        let mut inner = lock(&self.shared.inner);
        self.shared.abort_in_flight(&mut inner);
        inner.session.reset();
        self.shared.publish(&inner);
    }

    /// Current session.
    pub fn snapshot(&self) -> Session {
        lock(&self.shared.inner).session.clone()
    }

    /// Receives every published session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.updates.subscribe()
    }

    /// Waits until the session is no longer Streaming.
    pub async fn wait_until_settled(&self) -> Session {
        let mut updates = self.subscribe();
        let settled = updates
            .wait_for(|s| s.status() != SessionStatus::Streaming)
            .await
            .map(|s| Session::clone(&s));
        match settled {
            Ok(session) => session,
            Err(_) => self.snapshot(),
        }
    }

    /// Metrics collector used by this orchestrator.
    pub fn metrics(&self) -> Arc<dyn MetricsCollector> {
        Arc::clone(&self.shared.metrics)
    }
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.shared.inner);
        f.debug_struct("SessionOrchestrator")
            .field("status", &inner.session.status())
            .field("generation", &inner.generation)
            .finish()
    }
}

/// Builder for [`SessionOrchestrator`].
pub struct SessionOrchestratorBuilder {
    service: Arc<PolishService>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    on_complete: Option<CompletionHook>,
}

impl SessionOrchestratorBuilder {
    /// Sets the metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the completion hook.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(HistoryRecord) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> SessionOrchestrator {
        let session = Session::new();
        let (updates, _) = watch::channel(session.clone());

        SessionOrchestrator {
            shared: Arc::new(Shared {
                service: self.service,
                inner: Mutex::new(Inner {
                    session,
                    generation: 0,
                    cancel: None,
                    last_request: None,
                    started_at: None,
                }),
                updates,
                metrics: self
                    .metrics
                    .unwrap_or_else(|| Arc::new(NoopMetricsCollector)),
                on_complete: self.on_complete,
            }),
        }
    }
}

impl std::fmt::Debug for SessionOrchestratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestratorBuilder")
            .field("has_metrics", &self.metrics.is_some())
            .field("has_completion_hook", &self.on_complete.is_some())
            .finish()
    }
}
