//! Polish service: request construction, status classification and
//! streaming.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::auth::ApiKeyAuth;
use crate::config::ProviderConfig;
use crate::errors::{PolishError, PolishResult};
use crate::observability::redact;
use crate::prompts;
use crate::transport::{DeltaStream, HttpRequest, HttpTransport, StreamingResponse};
use crate::types::chat::{ChatRequest, Message};
use crate::types::mode::PolishMode;

/// Issues polish requests against an OpenAI-compatible provider.
pub struct PolishService {
    transport: Arc<dyn HttpTransport>,
}

impl PolishService {
    /// Creates a new polish service.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Starts a streaming polish and returns its deltas.
    ///
    /// If `cancel` fires before the response head arrives, or while an
    /// error body is being read, the request is dropped and an
    /// already-finished stream is returned. Non-success
    /// statuses are classified into [`PolishError`] variants.
    #[instrument(skip(self, text, config, instruction, cancel), fields(mode = %mode, model = %config.model))]
    pub async fn stream(
        &self,
        text: &str,
        mode: PolishMode,
        config: &ProviderConfig,
        instruction: Option<&str>,
        cancel: CancellationToken,
    ) -> PolishResult<DeltaStream> {
        if text.trim().is_empty() {
            return Err(PolishError::validation("Text to polish cannot be empty"));
        }

        let request = self.build_request(text, mode, config, instruction)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Cancelled before response head");
                return Ok(DeltaStream::empty(cancel.clone()));
            }
            response = self.transport.send_streaming(request) => response?,
        };

        if !response.is_success() {
            return tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Cancelled while reading error body");
                    Ok(DeltaStream::empty(cancel.clone()))
                }
                error = Self::classify(response, &config.model) => Err(error),
            };
        }

        Ok(DeltaStream::new(response.stream, cancel))
    }

    /// Runs a polish to completion and returns the raw response text.
    pub async fn polish(
        &self,
        text: &str,
        mode: PolishMode,
        config: &ProviderConfig,
        instruction: Option<&str>,
        cancel: CancellationToken,
    ) -> PolishResult<String> {
        self.stream(text, mode, config, instruction, cancel)
            .await?
            .collect_text()
            .await
    }

    /// Builds the HTTP request for a polish.
    fn build_request(
        &self,
        text: &str,
        mode: PolishMode,
        config: &ProviderConfig,
        instruction: Option<&str>,
    ) -> PolishResult<HttpRequest> {
        let chat = ChatRequest::streaming(
            config.model.clone(),
            vec![
                Message::system(prompts::system_prompt(mode, text)),
                Message::user(prompts::user_content(text, instruction)),
            ],
            config.temperature,
        );

        let body = serde_json::to_vec(&chat)?;

        let auth = ApiKeyAuth::from_config(config);
        auth.validate()?;

        let mut request = HttpRequest::post(config.completions_url(), body)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "text/event-stream")
            .with_timeout(config.timeout);
        auth.apply_auth(&mut request.headers);

        Ok(request)
    }

    async fn classify(response: StreamingResponse, model: &str) -> PolishError {
        let status = response.status;
        let retry_after = response
            .header("retry-after")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.into_text().await;

        tracing::warn!(status, body = %redact(&body), "Provider returned an error status");

        PolishError::from_status(status, body, model, retry_after)
    }
}

impl std::fmt::Debug for PolishService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishService").finish()
    }
}
