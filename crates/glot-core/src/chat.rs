//! Chat messages and request parameters.
//!
//! A request to the model is an ordered list of [`ChatMessage`]s — the
//! system persona first, then the user prompt. Messages are never
//! mutated after construction; the [task](crate::task) module builds
//! them and the client serializes them verbatim.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions and persona for the model.
    System,
    /// The end user's prompt.
    User,
    /// A prior model response (multi-turn context).
    Assistant,
}

/// A single message in the conversation.
///
/// Ordering within a message list is significant: providers interpret
/// the list front to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored this message.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Parameters for one chat completion request.
///
/// Use struct-update syntax for concise construction:
///
/// ```rust
/// use glot_core::{ChatMessage, ChatParams};
///
/// let params = ChatParams {
///     messages: vec![ChatMessage::user("Hello")],
///     max_tokens: Some(256),
///     ..Default::default()
/// };
/// ```
///
/// Serializes cleanly to JSON for logging and request replay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatParams {
    /// The message list, system message first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. `None` lets the client apply its default.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
}
