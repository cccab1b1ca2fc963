//! Streaming response types.
//!
//! A streaming request yields a sequence of [`StreamEvent`]s through a
//! [`TextStream`]: zero or more [`Chunk`](StreamEvent::Chunk)s in
//! emission order, closed by exactly one [`Done`](StreamEvent::Done).
//! Failures travel as the `Err` arm of the stream item and are terminal
//! — a decoder never emits anything after an error.
//!
//! # Collecting a stream
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use glot_core::{StreamEvent, TextStream};
//!
//! async fn print_stream(mut stream: TextStream) {
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             Ok(StreamEvent::Chunk(text)) => print!("{text}"),
//!             Ok(StreamEvent::Done) => println!("\n[done]"),
//!             Err(e) => eprintln!("stream error: {e}"),
//!         }
//!     }
//! }
//! ```
//!
//! The only way a stream ends without a terminal event is when the
//! consumer stops polling it — which is exactly how cancellation
//! suppresses output: the relay drops the stream and nothing further is
//! decoded or delivered.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::GlotError;

/// A pinned, boxed, `Send` stream of [`StreamEvent`] results.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, GlotError>> + Send>>;

/// An incremental event emitted during a streaming response.
///
/// This is a closed set — consumers dispatch with exhaustive matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A fragment of the model's text output.
    Chunk(String),
    /// The stream has ended. Emitted exactly once per healthy stream,
    /// whether the provider sent its end-of-stream sentinel or the body
    /// simply ended.
    Done,
}
