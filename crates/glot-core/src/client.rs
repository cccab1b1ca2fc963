//! The chat client trait and its object-safe counterpart.
//!
//! This module defines two abstractions:
//!
//! - **[`ChatClient`]** — the trait a backend implements. It uses native
//!   async-fn-in-traits (AFIT), so implementations are plain `async fn`s
//!   with no macro overhead.
//!
//! - **[`DynChatClient`]** — an object-safe mirror using boxed futures.
//!   A blanket `impl<T: ChatClient> DynChatClient for T` bridges the
//!   two, so any concrete client can be stored as
//!   `Arc<dyn DynChatClient>` with zero boilerplate. The relay holds its
//!   client this way.
//!
//! # Cancellation
//!
//! Both methods take a [`CancellationToken`]. Triggering it must abort
//! the underlying network operation promptly; the call then resolves to
//! [`GlotError::Cancelled`], which callers distinguish from real
//! failures via [`GlotError::is_cancellation`].

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::chat::ChatParams;
use crate::error::GlotError;
use crate::stream::TextStream;

/// A client capable of issuing chat completion requests.
///
/// `ChatClient` is **not** object-safe because AFIT returns
/// `impl Future`. When you need dynamic dispatch, use [`DynChatClient`]
/// — every `ChatClient` implements it via a blanket impl.
pub trait ChatClient: Send + Sync {
    /// Sends a streaming request and returns the decoded event stream.
    ///
    /// Triggering `cancel` before the response opens resolves the call
    /// to [`GlotError::Cancelled`]; once the stream is returned,
    /// dropping it aborts the transfer.
    fn stream(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<TextStream, GlotError>> + Send;

    /// Sends a non-streaming request and returns the complete response
    /// text, trimmed of surrounding whitespace. A response without
    /// content resolves to an empty string rather than failing.
    fn complete(
        &self,
        params: &ChatParams,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<String, GlotError>> + Send;
}

/// Object-safe counterpart of [`ChatClient`] for dynamic dispatch.
///
/// You rarely implement this directly — the blanket
/// `impl<T: ChatClient> DynChatClient for T` does it for you.
pub trait DynChatClient: Send + Sync {
    /// Boxed-future version of [`ChatClient::stream`].
    fn stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TextStream, GlotError>> + Send + 'a>>;

    /// Boxed-future version of [`ChatClient::complete`].
    fn complete_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<String, GlotError>> + Send + 'a>>;
}

impl<T: ChatClient> DynChatClient for T {
    fn stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TextStream, GlotError>> + Send + 'a>> {
        Box::pin(self.stream(params, cancel))
    }

    fn complete_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<String, GlotError>> + Send + 'a>> {
        Box::pin(self.complete(params, cancel))
    }
}
