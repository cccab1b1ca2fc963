//! Mock chat client for testing.
//!
//! [`MockChatClient`] is a queue-based fake that lets tests script
//! exactly what a client returns, without touching the network. It
//! implements [`ChatClient`], so it works anywhere a real client does —
//! including behind `Arc<dyn DynChatClient>` via the blanket impl.
//!
//! # Usage
//!
//! ```rust,ignore
//! use glot_core::mock::MockChatClient;
//! use glot_core::{ChatClient, ChatParams, StreamEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let mock = MockChatClient::new();
//! mock.queue_stream(vec![StreamEvent::Chunk("hi".into()), StreamEvent::Done]);
//!
//! let stream = mock
//!     .stream(&ChatParams::default(), CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert_eq!(mock.recorded_calls().len(), 1);
//! # }
//! ```
//!
//! # Why `MockError` instead of `GlotError`?
//!
//! [`GlotError`] is not `Clone`, so it can't sit in a queue that tests
//! may want to inspect. [`MockError`] mirrors the variants in a
//! cloneable form and converts at dequeue time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::chat::ChatParams;
use crate::client::ChatClient;
use crate::error::GlotError;
use crate::stream::{StreamEvent, TextStream};

/// Cloneable error subset for mock queuing.
///
/// Converted to [`GlotError`] when dequeued.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Maps to [`GlotError::NotConfigured`].
    NotConfigured(String),
    /// Maps to [`GlotError::Api`].
    Api {
        /// HTTP status code.
        status: http::StatusCode,
        /// Error message.
        message: String,
    },
    /// Maps to [`GlotError::Http`].
    Http {
        /// HTTP status code, if any.
        status: Option<http::StatusCode>,
        /// Error message.
        message: String,
    },
    /// Maps to [`GlotError::Timeout`].
    Timeout {
        /// Elapsed milliseconds.
        elapsed_ms: u64,
    },
    /// Maps to [`GlotError::Cancelled`].
    Cancelled,
}

impl MockError {
    fn into_glot_error(self) -> GlotError {
        match self {
            Self::NotConfigured(msg) => GlotError::NotConfigured(msg),
            Self::Api { status, message } => GlotError::Api { status, message },
            Self::Http { status, message } => GlotError::Http { status, message },
            Self::Timeout { elapsed_ms } => GlotError::Timeout { elapsed_ms },
            Self::Cancelled => GlotError::Cancelled,
        }
    }
}

/// One scripted outcome for a `stream` call.
#[derive(Debug, Clone)]
enum ScriptedStream {
    /// Yield these items, then end (or hang forever if `then_pending`).
    Events {
        items: Vec<Result<StreamEvent, MockError>>,
        then_pending: bool,
    },
    /// Fail the call itself, before any events are yielded.
    Error(MockError),
}

/// A queue-based mock client for unit and integration tests.
///
/// Push scripted outcomes with the `queue_*` methods. Each call to
/// `stream` or `complete` pops from the front of the respective queue
/// and records its [`ChatParams`] for later assertion.
///
/// A call made with an already-cancelled token resolves to
/// [`GlotError::Cancelled`] without consuming the queue, matching the
/// real client's behavior.
///
/// # Panics
///
/// `stream` and `complete` panic if their queue is empty.
pub struct MockChatClient {
    streams: Mutex<VecDeque<ScriptedStream>>,
    completions: Mutex<VecDeque<Result<String, MockError>>>,
    calls: Mutex<Vec<ChatParams>>,
}

impl fmt::Debug for MockChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockChatClient")
            .field("queued_streams", &self.streams.lock().unwrap().len())
            .field("queued_completions", &self.completions.lock().unwrap().len())
            .field("recorded_calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatClient {
    /// Creates a new mock with empty queues.
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
            completions: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues a well-formed stream: the given events, then end.
    pub fn queue_stream(&self, events: Vec<StreamEvent>) -> &Self {
        self.streams.lock().unwrap().push_back(ScriptedStream::Events {
            items: events.into_iter().map(Ok).collect(),
            then_pending: false,
        });
        self
    }

    /// Enqueues a stream that yields the given events and then hangs
    /// forever. Useful for cancellation and supersede tests, where the
    /// consumer must stop polling rather than wait for an end.
    pub fn queue_stream_then_pending(&self, events: Vec<StreamEvent>) -> &Self {
        self.streams.lock().unwrap().push_back(ScriptedStream::Events {
            items: events.into_iter().map(Ok).collect(),
            then_pending: true,
        });
        self
    }

    /// Enqueues a stream with explicit per-item results, for scripting
    /// mid-stream errors.
    pub fn queue_stream_items(&self, items: Vec<Result<StreamEvent, MockError>>) -> &Self {
        self.streams.lock().unwrap().push_back(ScriptedStream::Events {
            items,
            then_pending: false,
        });
        self
    }

    /// Enqueues an error for the next `stream` call, returned before
    /// any events are yielded (e.g. a missing key or a 4xx response).
    pub fn queue_stream_error(&self, error: MockError) -> &Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(ScriptedStream::Error(error));
        self
    }

    /// Enqueues a successful response for the next `complete` call.
    pub fn queue_completion(&self, text: impl Into<String>) -> &Self {
        self.completions.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Enqueues an error for the next `complete` call.
    pub fn queue_completion_error(&self, error: MockError) -> &Self {
        self.completions.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns a clone of all `ChatParams` passed to `stream` or
    /// `complete`, in call order.
    pub fn recorded_calls(&self) -> Vec<ChatParams> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, params: &ChatParams) {
        self.calls.lock().unwrap().push(params.clone());
    }
}

impl ChatClient for MockChatClient {
    async fn stream(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> Result<TextStream, GlotError> {
        self.record_call(params);
        if cancel.is_cancelled() {
            return Err(GlotError::Cancelled);
        }
        let scripted = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockChatClient: no queued streams remaining");
        match scripted {
            ScriptedStream::Error(e) => Err(e.into_glot_error()),
            ScriptedStream::Events {
                items,
                then_pending,
            } => {
                let head =
                    futures::stream::iter(items.into_iter().map(|r| r.map_err(MockError::into_glot_error)));
                if then_pending {
                    Ok(Box::pin(head.chain(futures::stream::pending())))
                } else {
                    Ok(Box::pin(head))
                }
            }
        }
    }

    async fn complete(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> Result<String, GlotError> {
        self.record_call(params);
        if cancel.is_cancelled() {
            return Err(GlotError::Cancelled);
        }
        let result = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockChatClient: no queued completions remaining");
        result.map_err(MockError::into_glot_error)
    }
}
