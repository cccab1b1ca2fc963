//! Client configuration.

use std::time::Duration;

/// Configuration for [`OpenAiClient`](crate::OpenAiClient).
///
/// Use struct update syntax with [`Default`] for ergonomic construction:
///
/// ```rust
/// use glot_openai::OpenAiConfig;
///
/// let config = OpenAiConfig {
///     api_key: "sk-...".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key. Required — requests fail fast with a "not configured"
    /// error when it is empty.
    pub api_key: String,
    /// Model identifier (e.g. `"gpt-4o-mini"`).
    pub model: String,
    /// Base URL for the API. Override for proxies or compatible servers.
    pub base_url: String,
    /// Whole-request timeout. `None` uses reqwest's default.
    pub timeout: Option<Duration>,
    /// Pre-configured HTTP client for connection pooling. When `None`,
    /// a new client is created.
    pub client: Option<reqwest::Client>,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("client", &self.client.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            timeout: None,
            client: None,
        }
    }
}
