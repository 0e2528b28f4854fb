//! Provider configuration.
//!
//! A [`ProviderConfig`] describes one OpenAI-compatible endpoint: where to
//! send requests, which key and model to use, and how to sample. Sessions
//! receive it per call and never mutate it.

use secrecy::SecretString;
use std::time::Duration;

use crate::auth::ApiKeyAuth;
use crate::errors::{PolishError, PolishResult};

/// Default endpoint when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default time allowed for the response head (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for one provider.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Identifier of the provider entry: a preset id, or "custom" when the
    /// endpoint matches no preset.
    pub provider_id: String,
    /// Base endpoint, without trailing slashes.
    pub endpoint: String,
    /// API key (stored securely).
    pub(crate) api_key: SecretString,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Time allowed for the response head. Streaming bodies are not limited.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `POLISHR_API_KEY` (required): API key for authentication
    /// - `POLISHR_ENDPOINT` (optional): Base endpoint
    /// - `POLISHR_MODEL` (optional): Model identifier
    /// - `POLISHR_TEMPERATURE` (optional): Sampling temperature
    /// - `POLISHR_TIMEOUT` (optional): Response head timeout in seconds
    pub fn from_env() -> PolishResult<Self> {
        let api_key = std::env::var("POLISHR_API_KEY").map_err(|_| {
            PolishError::configuration("POLISHR_API_KEY environment variable not set")
        })?;

        let mut builder = ProviderConfigBuilder::new().api_key(api_key);

        if let Ok(endpoint) = std::env::var("POLISHR_ENDPOINT") {
            builder = builder.endpoint(endpoint);
        }

        if let Ok(model) = std::env::var("POLISHR_MODEL") {
            builder = builder.model(model);
        }

        if let Ok(temperature) = std::env::var("POLISHR_TEMPERATURE") {
            if let Ok(temperature) = temperature.parse::<f32>() {
                builder = builder.temperature(temperature);
            }
        }

        if let Ok(timeout_str) = std::env::var("POLISHR_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        ApiKeyAuth::from_config(self).key_hint()
    }

    /// Returns the chat completions URL for this endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_id", &self.provider_id)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`ProviderConfig`].
#[derive(Default)]
pub struct ProviderConfigBuilder {
    provider_id: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout: Option<Duration>,
}

impl ProviderConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a built-in preset; the key still has to be supplied.
    pub fn from_preset(preset: &ProviderPreset) -> Self {
        Self {
            provider_id: Some(preset.id.to_string()),
            endpoint: Some(preset.endpoint.to_string()),
            model: Some(preset.model.to_string()),
            temperature: Some(preset.temperature),
            ..Self::default()
        }
    }

    /// Sets the provider identifier.
    pub fn provider_id(mut self, id: impl Into<String>) -> Self {
        self.provider_id = Some(id.into());
        self
    }

    /// Sets the base endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the response head timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PolishResult<ProviderConfig> {
        let api_key = self
            .api_key
            .ok_or_else(|| PolishError::configuration("API key is required"))?;

        if api_key.trim().is_empty() {
            return Err(PolishError::configuration("API key cannot be empty"));
        }

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = url::Url::parse(&endpoint)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PolishError::configuration(
                "Endpoint must use http or https",
            ));
        }
        if parsed.scheme() == "http" {
            tracing::warn!(endpoint = %endpoint, "Provider endpoint is not using HTTPS");
        }

        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(PolishError::configuration("Model cannot be empty"));
        }

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(PolishError::configuration(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        Ok(ProviderConfig {
            provider_id: self.provider_id.unwrap_or_else(|| {
                preset_for_endpoint(&endpoint)
                    .map_or("custom", |preset| preset.id)
                    .to_string()
            }),
            endpoint,
            api_key: SecretString::new(api_key),
            model,
            temperature,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// A built-in provider with a known endpoint and default model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderPreset {
    /// Stable identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Base endpoint.
    pub endpoint: &'static str,
    /// Default model.
    pub model: &'static str,
    /// Default temperature.
    pub temperature: f32,
}

/// Presets shipped with the client.
pub const PROVIDER_PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        id: "deepseek",
        name: "DeepSeek",
        endpoint: "https://api.deepseek.com/v1",
        model: "deepseek-chat",
        temperature: 0.3,
    },
    ProviderPreset {
        id: "openai",
        name: "OpenAI",
        endpoint: "https://api.openai.com/v1",
        model: "gpt-4o",
        temperature: 0.3,
    },
    ProviderPreset {
        id: "openrouter",
        name: "OpenRouter",
        endpoint: "https://openrouter.ai/api/v1",
        model: "openai/gpt-4o",
        temperature: 0.3,
    },
    ProviderPreset {
        id: "minimax",
        name: "MiniMax",
        endpoint: "https://api.minimax.chat/v1",
        model: "abab6.5s-chat",
        temperature: 0.3,
    },
];

/// Looks up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static ProviderPreset> {
    PROVIDER_PRESETS.iter().find(|p| p.id == id)
}

/// Looks up a preset whose endpoint matches, ignoring trailing slashes.
pub fn preset_for_endpoint(endpoint: &str) -> Option<&'static ProviderPreset> {
    let endpoint = endpoint.trim_end_matches('/');
    PROVIDER_PRESETS.iter().find(|p| p.endpoint == endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_builder_success() {
        let config = ProviderConfig::builder()
            .endpoint("https://api.deepseek.com/v1/")
            .api_key("sk-test-12345")
            .model("deepseek-chat")
            .temperature(0.7)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.endpoint, "https://api.deepseek.com/v1");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key().expose_secret(), "sk-test-12345");
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ProviderConfig::builder().api_key("sk-test").build().unwrap();

        assert_eq!(config.provider_id, "openai");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_config_builder_missing_api_key() {
        assert!(ProviderConfig::builder().build().is_err());
    }

    #[test]
    fn test_config_builder_blank_api_key() {
        assert!(ProviderConfig::builder().api_key("   ").build().is_err());
    }

    #[test]
    fn test_config_builder_rejects_bad_scheme() {
        let result = ProviderConfig::builder()
            .api_key("sk-test")
            .endpoint("ftp://example.com/v1")
            .build();
        assert!(matches!(result, Err(PolishError::Configuration { .. })));
    }

    #[test]
    fn test_config_builder_allows_local_http() {
        let config = ProviderConfig::builder()
            .api_key("sk-test")
            .endpoint("http://localhost:11434/v1")
            .build()
            .unwrap();
        assert_eq!(config.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_config_builder_rejects_temperature_out_of_range() {
        let result = ProviderConfig::builder()
            .api_key("sk-test")
            .temperature(2.5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_completions_url_strips_trailing_slashes() {
        let config = ProviderConfig::builder()
            .api_key("sk-test")
            .endpoint("https://openrouter.ai/api/v1///")
            .build()
            .unwrap();

        assert_eq!(
            config.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_preset() {
        let preset = find_preset("deepseek").unwrap();
        let config = ProviderConfigBuilder::from_preset(preset)
            .api_key("sk-test")
            .build()
            .unwrap();

        assert_eq!(config.provider_id, "deepseek");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.endpoint, "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_preset_for_endpoint() {
        let preset = preset_for_endpoint("https://openrouter.ai/api/v1/").unwrap();
        assert_eq!(preset.id, "openrouter");
        assert!(preset_for_endpoint("https://example.com").is_none());
    }

    #[test]
    fn test_api_key_hint() {
        let config = ProviderConfig::builder()
            .api_key("sk-secret-key-12345")
            .build()
            .unwrap();

        let hint = config.api_key_hint();
        assert_eq!(hint, "...2345");
        assert!(!hint.contains("secret"));
    }

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = ProviderConfig::builder()
            .api_key("sk-secret-key")
            .build()
            .unwrap();

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("sk-secret-key"));
    }
}
