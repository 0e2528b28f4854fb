//! Bearer-token authentication for provider requests.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::config::ProviderConfig;
use crate::errors::PolishError;

/// API key authentication.
///
/// Uses Bearer token authentication, which every OpenAI-compatible
/// provider accepts.
pub struct ApiKeyAuth {
    api_key: SecretString,
}

impl ApiKeyAuth {
    /// Creates a new API key authentication provider.
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Creates the authentication for a provider configuration.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.api_key().clone())
    }

    /// Gets a hint of the API key for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        let key = self.api_key.expose_secret();
        let count = key.chars().count();
        if count > 4 {
            let tail: String = key.chars().skip(count - 4).collect();
            format!("...{}", tail)
        } else {
            "****".to_string()
        }
    }

    /// Applies authentication to request headers.
    pub fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key.expose_secret()),
        );
    }

    /// Validates the credential before it is sent.
    pub fn validate(&self) -> Result<(), PolishError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(PolishError::configuration("API key cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("api_key", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(key: &str) -> ApiKeyAuth {
        ApiKeyAuth::new(SecretString::new(key.to_string()))
    }

    #[test]
    fn test_api_key_auth_apply() {
        let mut headers = HashMap::new();

        auth("sk-test-key-12345").apply_auth(&mut headers);

        assert_eq!(
            headers.get("Authorization"),
            Some(&"Bearer sk-test-key-12345".to_string())
        );
    }

    #[test]
    fn test_api_key_auth_from_config() {
        let config = ProviderConfig::builder()
            .api_key("sk-from-config")
            .build()
            .unwrap();
        let mut headers = HashMap::new();

        ApiKeyAuth::from_config(&config).apply_auth(&mut headers);

        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer sk-from-config")
        );
    }

    #[test]
    fn test_api_key_auth_validate() {
        assert!(auth("sk-test").validate().is_ok());
        assert!(auth("").validate().is_err());
    }

    #[test]
    fn test_api_key_hint_short_key() {
        assert_eq!(auth("abc").key_hint(), "****");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug_str = format!("{:?}", auth("sk-secret-key"));

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("sk-secret-key"));
    }
}
