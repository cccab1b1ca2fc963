//! Delivery of relay messages to surfaces.
//!
//! Delivery is fire-and-forget: the relay never waits for a surface to
//! acknowledge a message, and a vanished receiver (the user navigated
//! away, the widget was torn down) is not an error. Implementations
//! must swallow such failures.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::message::SurfaceMessage;

/// Identifies the UI surface (e.g. a browser tab) that owns a request.
///
/// At most one request is in flight per surface at any time — the
/// relay's central invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// An outbound channel to surfaces.
///
/// `deliver` returns `()` by design: there is no acknowledgement and no
/// backpressure. The send itself is at-least-once; whether the surface
/// is still there to receive it is not the relay's concern.
pub trait SurfaceSink: Send + Sync + 'static {
    /// Sends one message to the given surface, swallowing delivery
    /// failures.
    fn deliver(
        &self,
        surface: SurfaceId,
        message: SurfaceMessage,
    ) -> impl Future<Output = ()> + Send;
}

/// A [`SurfaceSink`] backed by an unbounded in-process channel.
///
/// The receiving half is handed to whatever owns the actual transport
/// to surfaces. Messages sent after the receiver is dropped are
/// discarded silently, matching the fire-and-forget contract.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(SurfaceId, SurfaceMessage)>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    pub fn new() -> (
        Self,
        mpsc::UnboundedReceiver<(SurfaceId, SurfaceMessage)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SurfaceSink for ChannelSink {
    async fn deliver(&self, surface: SurfaceId, message: SurfaceMessage) {
        if self.tx.send((surface, message)).is_err() {
            debug!(%surface, "surface receiver is gone; dropping message");
        }
    }
}
