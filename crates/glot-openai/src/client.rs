//! The chat request client.

use glot_core::task::DEFAULT_TEMPERATURE;
use glot_core::{ChatClient, ChatParams, GlotError, TextStream};
use reqwest::header::{HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::OpenAiConfig;
use crate::sse;
use crate::types;

/// Streaming-capable client for the Chat Completions API.
///
/// Implements [`ChatClient`]: [`stream`](ChatClient::stream) opens one
/// streaming request and returns the decoded event stream;
/// [`complete`](ChatClient::complete) performs the same call with
/// streaming disabled and returns the response text.
///
/// # Example
///
/// ```rust,no_run
/// use glot_core::{ChatClient, TaskKind};
/// use glot_openai::{OpenAiClient, OpenAiConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), glot_core::GlotError> {
/// let client = OpenAiClient::new(OpenAiConfig {
///     api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
///     ..Default::default()
/// });
///
/// let params = TaskKind::Translate.params("你好");
/// let stream = client.stream(&params, CancellationToken::new()).await?;
/// # let _ = stream;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client from configuration.
    ///
    /// If `config.client` is `Some`, that client is reused for
    /// connection pooling. Otherwise a new client is built with the
    /// configured timeout.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = config.client.clone().unwrap_or_else(|| {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = config.timeout {
                builder = builder.timeout(timeout);
            }
            builder.build().expect("failed to build HTTP client")
        });
        Self { config, client }
    }

    /// Build the default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap, GlotError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", self.config.api_key);
        headers.insert(
            "authorization",
            HeaderValue::from_str(&auth_value).map_err(|_| {
                GlotError::NotConfigured("API key contains invalid header characters".into())
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    /// Build the full URL for the chat completions endpoint.
    fn completions_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Send one request and return the raw response, mapping non-2xx
    /// statuses and transport failures to [`GlotError`].
    async fn send_request(
        &self,
        params: &ChatParams,
        stream: bool,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, GlotError> {
        if self.config.api_key.is_empty() {
            return Err(GlotError::NotConfigured(
                "API key is not set; configure it before sending requests".into(),
            ));
        }
        if cancel.is_cancelled() {
            return Err(GlotError::Cancelled);
        }

        let body = types::Request {
            model: &self.config.model,
            messages: &params.messages,
            temperature: params.temperature.or(Some(DEFAULT_TEMPERATURE)),
            max_tokens: params.max_tokens,
            stream,
        };

        let request = self
            .client
            .post(self.completions_url())
            .headers(self.default_headers()?)
            .json(&body);

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(GlotError::Cancelled),
            result = request.send() => result.map_err(|e| self.map_transport_error(&e))?,
        };

        let status = http_status(response.status());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GlotError::Api {
                status,
                message: error_message(status, &body),
            });
        }

        Ok(response)
    }

    fn map_transport_error(&self, e: &reqwest::Error) -> GlotError {
        if e.is_timeout() {
            GlotError::Timeout {
                elapsed_ms: self
                    .config
                    .timeout
                    .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            }
        } else {
            GlotError::Http {
                status: e.status().map(http_status),
                message: e.to_string(),
            }
        }
    }
}

/// Convert a reqwest status to the `http` crate's status type.
fn http_status(status: reqwest::StatusCode) -> http::StatusCode {
    http::StatusCode::from_u16(status.as_u16()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
}

/// Extract the provider's error message from a non-2xx body, falling
/// back to a generic description when the body is unparseable.
fn error_message(status: http::StatusCode, body: &str) -> String {
    serde_json::from_str::<types::ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("request failed: {status}"))
}

impl ChatClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn stream(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> Result<TextStream, GlotError> {
        let response = self.send_request(params, true, &cancel).await?;
        Ok(sse::into_stream(response))
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> Result<String, GlotError> {
        let response = self.send_request(params, false, &cancel).await?;

        let body = tokio::select! {
            () = cancel.cancelled() => return Err(GlotError::Cancelled),
            result = response.text() => result.map_err(|e| GlotError::ResponseFormat {
                message: format!("failed to read response body: {e}"),
                raw: String::new(),
            })?,
        };

        let parsed: types::Response =
            serde_json::from_str(&body).map_err(|e| GlotError::ResponseFormat {
                message: format!("failed to parse response: {e}"),
                raw: body,
            })?;

        Ok(parsed
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string())
    }
}
