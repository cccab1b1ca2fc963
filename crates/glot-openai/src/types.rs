//! Chat Completions API request and response types.
//!
//! These types mirror the provider's wire format and are not part of
//! the public API. [`glot_core::ChatMessage`] already serializes to the
//! wire message shape (`{role, content}`), so requests borrow the
//! caller's message list directly.

use glot_core::ChatMessage;
use serde::{Deserialize, Serialize};

// ── Request types ──────────────────────────────────────────────────

/// Top-level request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

// ── Response types ─────────────────────────────────────────────────

/// Non-streaming response body.
#[derive(Debug, Deserialize)]
pub(crate) struct Response {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseChoice {
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

/// One streamed frame's payload. Heartbeats may carry no choices and
/// deltas may carry no content — both fields tolerate absence.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Delta {
    pub content: Option<String>,
}

/// Best-effort error body: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}
