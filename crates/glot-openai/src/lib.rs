//! # glot-openai
//!
//! Streaming chat client for the OpenAI Chat Completions API (and
//! compatible servers).
//!
//! [`OpenAiClient`] implements [`glot_core::ChatClient`]: it issues one
//! `POST /chat/completions` per call, surfaces non-2xx responses with
//! the provider's own error message, decodes streaming bodies into
//! ordered [`glot_core::StreamEvent`]s, and aborts promptly when its
//! cancellation token fires.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use glot_core::{ChatClient, StreamEvent, TaskKind};
//! use glot_openai::{OpenAiClient, OpenAiConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), glot_core::GlotError> {
//! let client = OpenAiClient::new(OpenAiConfig {
//!     api_key: "sk-...".into(),
//!     ..Default::default()
//! });
//!
//! let params = TaskKind::WordLearning.params("serendipity");
//! let mut stream = client.stream(&params, CancellationToken::new()).await?;
//! while let Some(event) = stream.next().await {
//!     match event? {
//!         StreamEvent::Chunk(text) => print!("{text}"),
//!         StreamEvent::Done => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
pub mod config;
mod sse;
mod types;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
