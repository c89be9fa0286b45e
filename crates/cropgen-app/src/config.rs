//! Generation endpoint configuration.
//!
//! Values come from the environment:
//!
//! - `API_HOST` - service base URL, defaults to `https://api.stability.ai`
//! - `STABILITY_API_KEY` - bearer token, no default
//!
//! A missing key is not an error here; the client refuses to submit
//! without one, so previews and exports still work unconfigured.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Default service base URL.
pub const DEFAULT_API_HOST: &str = "https://api.stability.ai";

/// Engine used for image-to-image generation.
pub const ENGINE_ID: &str = "stable-diffusion-xl-1024-v1-0";

pub const API_HOST_VAR: &str = "API_HOST";
pub const API_KEY_VAR: &str = "STABILITY_API_KEY";

/// Errors in user-supplied configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{API_HOST_VAR} must be an http(s) URL, got {0:?}")]
    InvalidHost(String),
}

/// Where and how generation requests are sent.
#[derive(Clone)]
pub struct GenerationConfig {
    api_host: String,
    api_key: Option<String>,
    pub engine_id: String,
    /// Whole-request timeout. `None` waits for the service indefinitely.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_host", &self.api_host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("engine_id", &self.engine_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: None,
            engine_id: ENGINE_ID.to_string(),
            timeout: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl GenerationConfig {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through `lookup`, which maps a variable name
    /// to its value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = non_empty(lookup(API_HOST_VAR)) {
            config = config.with_api_host(host)?;
        }
        config.api_key = non_empty(lookup(API_KEY_VAR));
        Ok(config)
    }

    /// Replace the service base URL. A trailing `/` is dropped.
    pub fn with_api_host(mut self, host: impl Into<String>) -> Result<Self, ConfigError> {
        let host = host.into();
        let trimmed = host.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidHost(host));
        }
        self.api_host = trimmed.to_string();
        Ok(self)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = non_empty(Some(key.into()));
        self
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Full image-to-image endpoint URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/image-to-image",
            self.api_host, self.engine_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = GenerationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert_eq!(config.api_key(), None);
        assert_eq!(
            config.endpoint(),
            "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/image-to-image"
        );
    }

    #[test]
    fn test_values_from_environment() {
        let config = GenerationConfig::from_lookup(lookup(&[
            ("API_HOST", "http://localhost:8080/"),
            ("STABILITY_API_KEY", " sk-test "),
        ]))
        .unwrap();
        assert_eq!(config.api_host(), "http://localhost:8080");
        assert_eq!(config.api_key(), Some("sk-test"));
        assert!(config.endpoint().starts_with("http://localhost:8080/v1/generation/"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = GenerationConfig::from_lookup(lookup(&[
            ("API_HOST", "  "),
            ("STABILITY_API_KEY", ""),
        ]))
        .unwrap();
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_rejects_non_http_host() {
        let err = GenerationConfig::from_lookup(lookup(&[("API_HOST", "ftp://example.com")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidHost("ftp://example.com".to_string()));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenerationConfig::default().with_api_key("sk-secret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
