// Configuration for the Responses client

use std::time::Duration;

use crate::error::{Error, Result};

/// Default API base (OpenRouter's OpenAI-compatible endpoint)
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Environment variable read by `Config::from_env`
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// Base URL for the API (optional, defaults to OpenRouter)
    pub base_url: Option<String>,
    /// Transport-level timeout applied to the whole request
    pub timeout: Option<Duration>,
    /// Optional `HTTP-Referer` attribution header (OpenRouter rankings)
    pub referer: Option<String>,
    /// Optional `X-Title` attribution header
    pub title: Option<String>,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: None,
            referer: None,
            title: None,
        }
    }

    /// Read the API key from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::Config(format!("{} is not set", API_KEY_ENV)))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Effective base URL (configured or default), without trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(OPENROUTER_API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = Config::new("test-key");
        assert_eq!(config.base_url(), OPENROUTER_API_BASE);
    }

    #[test]
    fn test_base_url_override_trims_trailing_slash() {
        let config = Config::new("test-key").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_builder_chain() {
        let config = Config::new("test-key")
            .with_timeout(Duration::from_secs(30))
            .with_referer("https://example.com")
            .with_title("Example App");

        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.referer.as_deref(), Some("https://example.com"));
        assert_eq!(config.title.as_deref(), Some("Example App"));
    }
}
