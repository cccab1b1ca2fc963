//! Pre-built helpers for testing code that uses `glot-core` types.
//!
//! Available when the `test-utils` feature is enabled, allowing
//! downstream crates to reuse these utilities in their own test suites.
//! Also compiled during `#[cfg(test)]` for this crate's own tests.

use futures::StreamExt;

use crate::chat::ChatMessage;
use crate::error::GlotError;
use crate::stream::{StreamEvent, TextStream};

/// Collect stream events, returning results including errors.
pub async fn collect_stream_results(stream: TextStream) -> Vec<Result<StreamEvent, GlotError>> {
    stream.collect::<Vec<_>>().await
}

/// Collect stream events, panicking on any error.
/// Use [`collect_stream_results`] when testing error scenarios.
pub async fn collect_stream(stream: TextStream) -> Vec<StreamEvent> {
    stream
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|r| r.expect("stream event should be Ok"))
        .collect()
}

/// Concatenates the text of every `Chunk` in `events`.
pub fn concat_chunks(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk(text) => Some(text.as_str()),
            StreamEvent::Done => None,
        })
        .collect()
}

/// Shorthand for [`ChatMessage::user`].
pub fn user_msg(text: &str) -> ChatMessage {
    ChatMessage::user(text)
}

/// Shorthand for [`ChatMessage::system`].
pub fn system_msg(text: &str) -> ChatMessage {
    ChatMessage::system(text)
}
