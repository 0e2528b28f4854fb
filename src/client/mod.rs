//! Polishr client.
//!
//! Bundles a provider configuration, a transport and a metrics collector,
//! and hands out sessions bound to them.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ProviderConfig, ProviderConfigBuilder, ProviderPreset};
use crate::errors::{PolishError, PolishResult};
use crate::observability::{DefaultMetricsCollector, MetricsCollector};
use crate::services::PolishService;
use crate::session::{PolishRequest, SessionOrchestrator};
use crate::transport::{HttpTransport, HttpTransportImpl};
use crate::types::history::HistoryRecord;
use crate::types::mode::PolishMode;

/// The main Polishr client.
///
/// # Example
///
/// ```rust,no_run
/// use polishr_client::{PolishMode, PolishrClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = PolishrClient::builder()
///         .api_key("sk-your-api-key")
///         .model("gpt-4o")
///         .build()?;
///
///     let session = client.session();
///     session.start(client.request("Their going to the park tomorow", PolishMode::Improve));
///
///     let done = session.wait_until_settled().await;
///     println!("{}", done.final_text());
///     Ok(())
/// }
/// ```
pub struct PolishrClient {
    config: ProviderConfig,
    service: Arc<PolishService>,
    metrics: Arc<dyn MetricsCollector>,
}

impl PolishrClient {
    /// Creates a new client builder.
    pub fn builder() -> PolishrClientBuilder {
        PolishrClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ProviderConfig::from_env`] for the variables read.
    pub fn from_env() -> PolishResult<Self> {
        PolishrClientBuilder::from_config(ProviderConfig::from_env()?).build()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Returns the polish service.
    pub fn polish_service(&self) -> &PolishService {
        &self.service
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> Arc<dyn MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Builds a request against this client's configuration.
    pub fn request(&self, text: impl Into<String>, mode: PolishMode) -> PolishRequest {
        PolishRequest::new(text, mode, self.config.clone())
    }

    /// Runs a polish to completion and returns the raw response text.
    pub async fn polish(&self, text: &str, mode: PolishMode) -> PolishResult<String> {
        self.service
            .polish(text, mode, &self.config, None, CancellationToken::new())
            .await
    }

    /// Creates a session sharing this client's transport and metrics.
    pub fn session(&self) -> SessionOrchestrator {
        SessionOrchestrator::builder(Arc::clone(&self.service))
            .metrics(Arc::clone(&self.metrics))
            .build()
    }

    /// Creates a session that reports every completion to `hook`.
    pub fn session_with_hook<F>(&self, hook: F) -> SessionOrchestrator
    where
        F: Fn(HistoryRecord) + Send + Sync + 'static,
    {
        SessionOrchestrator::builder(Arc::clone(&self.service))
            .metrics(Arc::clone(&self.metrics))
            .on_complete(hook)
            .build()
    }
}

impl std::fmt::Debug for PolishrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishrClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the Polishr client.
pub struct PolishrClientBuilder {
    config_builder: ProviderConfigBuilder,
    config: Option<ProviderConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl PolishrClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: ProviderConfigBuilder::new(),
            config: None,
            transport: None,
            metrics: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: ProviderConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Starts from a built-in provider preset.
    pub fn preset(mut self, preset: &ProviderPreset) -> Self {
        self.config_builder = ProviderConfigBuilder::from_preset(preset);
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.endpoint(endpoint);
        self
    }

    /// Sets the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.model(model);
        self
    }

    /// Sets the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config_builder = self.config_builder.temperature(temperature);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the client.
    pub fn build(self) -> PolishResult<PolishrClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransportImpl::new().map_err(PolishError::from)?),
        };

        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(DefaultMetricsCollector::new()));

        tracing::debug!(
            provider = %config.provider_id,
            model = %config.model,
            key = %config.api_key_hint(),
            "Polishr client built"
        );

        Ok(PolishrClient {
            config,
            service: Arc::new(PolishService::new(transport)),
            metrics,
        })
    }
}

impl Default for PolishrClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PolishrClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishrClientBuilder")
            .field("has_config", &self.config.is_some())
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::find_preset;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::session::SessionStatus;

    fn client(transport: Arc<MockTransport>) -> PolishrClient {
        PolishrClient::builder()
            .api_key("sk-test-key")
            .endpoint("https://api.example.com/v1")
            .model("test-model")
            .transport(transport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_key() {
        let err = PolishrClient::builder()
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, PolishError::Configuration { .. }));
    }

    #[test]
    fn test_builder_from_preset() {
        let preset = find_preset("deepseek").unwrap();
        let client = PolishrClient::builder()
            .preset(preset)
            .api_key("sk-test-key")
            .transport(Arc::new(MockTransport::new()))
            .build()
            .unwrap();

        assert_eq!(client.config().provider_id, "deepseek");
        assert_eq!(client.config().model, preset.model);
    }

    #[tokio::test]
    async fn test_polish_returns_raw_text() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::deltas(&["Hello", " world"]));

        let text = client(transport).polish("hello world", PolishMode::Improve).await.unwrap();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn test_sessions_share_metrics() {
        let transport = Arc::new(MockTransport::new());
        transport.set_default(MockResponse::deltas(&["Done."]));
        let client = client(transport);

        let session = client.session();
        session.start(client.request("done", PolishMode::Improve));
        let settled = session.wait_until_settled().await;

        assert_eq!(settled.status(), SessionStatus::Completed);
        let metrics = client.metrics().get_metrics();
        assert_eq!(metrics.sessions_started, 1);
        assert_eq!(metrics.sessions_completed, 1);
        assert_eq!(metrics.deltas, 1);
    }
}
