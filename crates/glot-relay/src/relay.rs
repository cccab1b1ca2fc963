//! The per-surface request relay.
//!
//! [`Relay`] owns the registry mapping each surface to its single
//! in-flight request. Starting a task for a surface that already has
//! one cancels the old request first (supersede — the new request
//! always wins, silently). Cancellation is idempotent: cancelling a
//! surface with nothing in flight is a no-op.
//!
//! # Message ordering
//!
//! Within one request, chunk messages reach the sink in decode order —
//! the pump awaits each delivery before polling the stream again — and
//! the terminal message (done or error) is always last. A cancelled
//! request delivers nothing further at all, not even a terminal
//! message: the surface initiated the cancellation and already knows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use glot_core::task::translation_params;
use glot_core::{DynChatClient, GlotError, Lang, StreamEvent, TaskKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::message::{SurfaceMessage, SurfaceRequest};
use crate::sink::{SurfaceId, SurfaceSink};

/// One registered in-flight request.
///
/// The `id` is unique across the relay's lifetime and guards the
/// completion path: a finished request only removes the registry entry
/// if the entry still carries its own id, so a request that was
/// superseded mid-flight can never evict its successor.
struct ActiveRequest {
    id: u64,
    token: CancellationToken,
}

struct RelayInner<S> {
    client: Arc<dyn DynChatClient>,
    sink: S,
    active: Mutex<HashMap<SurfaceId, ActiveRequest>>,
    next_request_id: AtomicU64,
}

/// Relays assist requests from surfaces to the chat client and streams
/// results back, enforcing at most one in-flight request per surface.
///
/// `Relay` is a cheap handle; clone it freely. All clones share the
/// same registry.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use glot_core::DynChatClient;
/// use glot_openai::{OpenAiClient, OpenAiConfig};
/// use glot_relay::{ChannelSink, Relay, SurfaceId, SurfaceRequest};
///
/// # async fn example() {
/// let client: Arc<dyn DynChatClient> = Arc::new(OpenAiClient::new(OpenAiConfig {
///     api_key: "sk-...".into(),
///     ..Default::default()
/// }));
/// let (sink, mut rx) = ChannelSink::new();
/// let relay = Relay::new(client, sink);
///
/// relay.handle(
///     SurfaceId(1),
///     SurfaceRequest::Translate { text: "你好".into() },
/// );
/// while let Some((surface, message)) = rx.recv().await {
///     println!("{surface}: {}", message.action());
/// }
/// # }
/// ```
pub struct Relay<S: SurfaceSink> {
    inner: Arc<RelayInner<S>>,
}

impl<S: SurfaceSink> Clone for Relay<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SurfaceSink> Relay<S> {
    /// Creates a relay over the given client and sink.
    pub fn new(client: Arc<dyn DynChatClient>, sink: S) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                client,
                sink,
                active: Mutex::new(HashMap::new()),
                next_request_id: AtomicU64::new(0),
            }),
        }
    }

    /// Dispatches one inbound surface request.
    pub fn handle(&self, surface: SurfaceId, request: SurfaceRequest) {
        match request {
            SurfaceRequest::WordLearning { text } => {
                self.start(surface, TaskKind::WordLearning, text);
            }
            SurfaceRequest::PhraseLearning { text } => {
                self.start(surface, TaskKind::PhraseLearning, text);
            }
            SurfaceRequest::Translate { text } => {
                self.start(surface, TaskKind::Translate, text);
            }
            SurfaceRequest::Check { text } => {
                self.start(surface, TaskKind::Check, text);
            }
            SurfaceRequest::StopStreaming => self.cancel(surface),
        }
    }

    /// Starts a task for a surface, superseding any request already in
    /// flight there. Returns immediately; results arrive through the
    /// sink.
    pub fn start(&self, surface: SurfaceId, kind: TaskKind, text: String) {
        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut active = self.lock_active();
            if let Some(previous) = active.insert(
                surface,
                ActiveRequest {
                    id,
                    token: token.clone(),
                },
            ) {
                debug!(%surface, %kind, "superseding in-flight request");
                previous.token.cancel();
            }
        }

        let relay = self.clone();
        tokio::spawn(async move {
            relay.run_request(surface, id, kind, &text, &token).await;
        });
    }

    /// Cancels the surface's in-flight request, if any. Safe to call
    /// redundantly or after natural completion.
    pub fn cancel(&self, surface: SurfaceId) {
        if let Some(request) = self.lock_active().remove(&surface) {
            debug!(%surface, "cancelling active request");
            request.token.cancel();
        }
    }

    /// One-shot directional translation, bypassing the streaming
    /// pipeline and the registry.
    pub async fn translate_once(
        &self,
        text: &str,
        source: Lang,
        target: Lang,
    ) -> Result<String, GlotError> {
        let params = translation_params(text, source, target);
        self.inner
            .client
            .complete_boxed(&params, CancellationToken::new())
            .await
    }

    /// Surfaces with a registered in-flight request.
    pub fn active_surfaces(&self) -> Vec<SurfaceId> {
        self.lock_active().keys().copied().collect()
    }

    fn lock_active(&self) -> MutexGuard<'_, HashMap<SurfaceId, ActiveRequest>> {
        self.inner
            .active
            .lock()
            .expect("active request registry lock poisoned")
    }

    async fn run_request(
        &self,
        surface: SurfaceId,
        id: u64,
        kind: TaskKind,
        text: &str,
        token: &CancellationToken,
    ) {
        self.pump(surface, kind, text, token).await;

        // Remove the registry entry only if it is still ours: a newer
        // request may have superseded this one between the last read
        // and this point, and evicting it would break its cancellation.
        let mut active = self.lock_active();
        if active.get(&surface).is_some_and(|entry| entry.id == id) {
            active.remove(&surface);
        }
    }

    /// Runs one request to completion: prompt → client → stream →
    /// sink. Cancellation at any point stops delivery entirely.
    async fn pump(
        &self,
        surface: SurfaceId,
        kind: TaskKind,
        text: &str,
        token: &CancellationToken,
    ) {
        let params = kind.params(text);
        let mut stream = match self.inner.client.stream_boxed(&params, token.clone()).await {
            Ok(stream) => stream,
            Err(e) if e.is_cancellation() => {
                debug!(%surface, %kind, "request cancelled before the stream opened");
                return;
            }
            Err(e) => {
                self.report_error(surface, kind, &e).await;
                return;
            }
        };

        loop {
            let event = tokio::select! {
                () = token.cancelled() => {
                    // Dropping the stream aborts the transfer; the
                    // surface asked for the cancellation, so it gets
                    // no further messages.
                    debug!(%surface, %kind, "request cancelled mid-stream");
                    return;
                }
                event = stream.next() => event,
            };

            match event {
                Some(Ok(StreamEvent::Chunk(content))) => {
                    self.inner
                        .sink
                        .deliver(surface, SurfaceMessage::Chunk { task: kind, content })
                        .await;
                }
                Some(Ok(StreamEvent::Done)) | None => {
                    self.inner
                        .sink
                        .deliver(surface, SurfaceMessage::Done { task: kind })
                        .await;
                    return;
                }
                Some(Err(e)) if e.is_cancellation() => return,
                Some(Err(e)) => {
                    self.report_error(surface, kind, &e).await;
                    return;
                }
            }
        }
    }

    async fn report_error(&self, surface: SurfaceId, kind: TaskKind, error: &GlotError) {
        warn!(%surface, %kind, %error, "request failed");
        self.inner
            .sink
            .deliver(
                surface,
                SurfaceMessage::Error {
                    task: kind,
                    error: error.to_string(),
                },
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glot_core::mock::{MockChatClient, MockError};
    use crate::sink::ChannelSink;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::error::TryRecvError;

    type Rx = UnboundedReceiver<(SurfaceId, SurfaceMessage)>;

    fn mock_relay() -> (Relay<ChannelSink>, Arc<MockChatClient>, Rx) {
        let mock = Arc::new(MockChatClient::new());
        let (sink, rx) = ChannelSink::new();
        let relay = Relay::new(mock.clone() as Arc<dyn DynChatClient>, sink);
        (relay, mock, rx)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// Give spawned tasks a chance to run, then assert the channel has
    /// nothing queued.
    async fn assert_no_messages(rx: &mut Rx) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_relays_chunks_then_done_in_order() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream(vec![
            StreamEvent::Chunk("你".into()),
            StreamEvent::Chunk("好".into()),
            StreamEvent::Done,
        ]);

        let surface = SurfaceId(1);
        relay.start(surface, TaskKind::Translate, "hello".into());

        assert_eq!(
            rx.recv().await.unwrap(),
            (
                surface,
                SurfaceMessage::Chunk {
                    task: TaskKind::Translate,
                    content: "你".into()
                }
            )
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            (
                surface,
                SurfaceMessage::Chunk {
                    task: TaskKind::Translate,
                    content: "好".into()
                }
            )
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            (
                surface,
                SurfaceMessage::Done {
                    task: TaskKind::Translate
                }
            )
        );

        wait_until(|| relay.active_surfaces().is_empty()).await;
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_request_uses_task_params() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream(vec![StreamEvent::Done]);

        relay.start(SurfaceId(1), TaskKind::WordLearning, "serendipity".into());
        let _ = rx.recv().await.unwrap();

        let calls = mock.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(0.7));
        assert_eq!(calls[0].max_tokens, Some(2000));
        assert_eq!(calls[0].messages.len(), 2);
        assert!(calls[0].messages[1].content.contains("serendipity"));
    }

    #[tokio::test]
    async fn test_stream_without_done_event_still_terminates() {
        let (relay, mock, mut rx) = mock_relay();
        // The scripted stream just ends; the relay still owes the
        // surface exactly one terminal message.
        mock.queue_stream(vec![StreamEvent::Chunk("a".into())]);

        relay.start(SurfaceId(1), TaskKind::Check, "x".into());

        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Chunk { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Done { .. }
        ));
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_call_error_is_relayed_with_namespace() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream_error(MockError::Api {
            status: http::StatusCode::UNAUTHORIZED,
            message: "invalid key".into(),
        });

        relay.start(SurfaceId(3), TaskKind::Check, "is this ok".into());

        let (surface, message) = rx.recv().await.unwrap();
        assert_eq!(surface, SurfaceId(3));
        match message {
            SurfaceMessage::Error { task, error } => {
                assert_eq!(task, TaskKind::Check);
                assert!(error.contains("invalid key"));
            }
            other => panic!("expected error message, got {other:?}"),
        }
        assert_no_messages(&mut rx).await;
        wait_until(|| relay.active_surfaces().is_empty()).await;
    }

    #[tokio::test]
    async fn test_mid_stream_error_is_terminal() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream_items(vec![
            Ok(StreamEvent::Chunk("partial".into())),
            Err(MockError::Http {
                status: None,
                message: "connection reset".into(),
            }),
        ]);

        relay.start(SurfaceId(1), TaskKind::Translate, "x".into());

        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Chunk { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Error { .. }
        ));
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_cancel_with_no_active_request_is_noop() {
        let (relay, _mock, mut rx) = mock_relay();
        relay.cancel(SurfaceId(9));
        relay.cancel(SurfaceId(9));
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_suppresses_all_messages() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream_then_pending(vec![StreamEvent::Chunk("first".into())]);

        let surface = SurfaceId(1);
        relay.start(surface, TaskKind::Translate, "x".into());

        // Exactly one chunk arrives, then the stream hangs.
        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Chunk { .. }
        ));

        relay.cancel(surface);
        assert!(relay.active_surfaces().is_empty());

        // No done, no error — nothing after cancellation.
        assert_no_messages(&mut rx).await;

        // A second cancel is still a no-op.
        relay.cancel(surface);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream(vec![StreamEvent::Done]);

        let surface = SurfaceId(1);
        relay.start(surface, TaskKind::Check, "x".into());
        assert!(matches!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Done { .. }
        ));
        wait_until(|| relay.active_surfaces().is_empty()).await;

        relay.cancel(surface);
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_new_request_supersedes_previous() {
        let (relay, mock, mut rx) = mock_relay();
        // First request hangs forever; it must produce no terminal
        // message once superseded.
        mock.queue_stream_then_pending(vec![]);
        mock.queue_stream(vec![StreamEvent::Chunk("second".into()), StreamEvent::Done]);

        let surface = SurfaceId(1);
        relay.start(surface, TaskKind::Translate, "one".into());
        wait_until(|| mock.recorded_calls().len() == 1).await;

        relay.start(surface, TaskKind::Translate, "two".into());

        assert_eq!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Chunk {
                task: TaskKind::Translate,
                content: "second".into()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap().1,
            SurfaceMessage::Done {
                task: TaskKind::Translate
            }
        );

        // Exactly one terminal message total — the superseded request
        // contributed nothing.
        assert_no_messages(&mut rx).await;
        wait_until(|| relay.active_surfaces().is_empty()).await;
        assert_eq!(mock.recorded_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_completed_request_does_not_evict_successor() {
        let (relay, mock, mut rx) = mock_relay();
        // First request completes normally; second hangs. The first
        // request's cleanup runs after the second is registered and
        // must leave the second's entry alone.
        mock.queue_stream(vec![StreamEvent::Done]);
        mock.queue_stream_then_pending(vec![]);

        let surface = SurfaceId(1);
        relay.start(surface, TaskKind::Translate, "one".into());
        wait_until(|| mock.recorded_calls().len() == 1).await;
        relay.start(surface, TaskKind::Translate, "two".into());
        wait_until(|| mock.recorded_calls().len() == 2).await;

        // Drain whatever the first request managed to deliver.
        tokio::time::sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}

        // The second request is still registered and cancellable.
        assert_eq!(relay.active_surfaces(), vec![surface]);
        relay.cancel(surface);
        assert!(relay.active_surfaces().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_surfaces_do_not_cross_wire() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream(vec![StreamEvent::Chunk("word".into()), StreamEvent::Done]);
        mock.queue_stream(vec![StreamEvent::Chunk("译文".into()), StreamEvent::Done]);

        relay.start(SurfaceId(1), TaskKind::WordLearning, "a".into());
        wait_until(|| mock.recorded_calls().len() == 1).await;
        relay.start(SurfaceId(2), TaskKind::Translate, "b".into());

        let mut received: Vec<(SurfaceId, SurfaceMessage)> = Vec::new();
        for _ in 0..4 {
            received.push(rx.recv().await.unwrap());
        }

        for (surface, message) in &received {
            match surface {
                SurfaceId(1) => assert_eq!(message.task(), TaskKind::WordLearning),
                SurfaceId(2) => assert_eq!(message.task(), TaskKind::Translate),
                other => panic!("unexpected surface {other}"),
            }
        }
        let done_count = received
            .iter()
            .filter(|(_, m)| matches!(m, SurfaceMessage::Done { .. }))
            .count();
        assert_eq!(done_count, 2);
    }

    #[tokio::test]
    async fn test_handle_dispatches_tasks_and_stop() {
        let (relay, mock, mut rx) = mock_relay();
        mock.queue_stream_then_pending(vec![StreamEvent::Chunk("x".into())]);

        let surface = SurfaceId(5);
        relay.handle(
            surface,
            SurfaceRequest::PhraseLearning {
                text: "break a leg".into(),
            },
        );
        assert_eq!(
            rx.recv().await.unwrap().1.task(),
            TaskKind::PhraseLearning
        );

        relay.handle(surface, SurfaceRequest::StopStreaming);
        assert!(relay.active_surfaces().is_empty());
        assert_no_messages(&mut rx).await;
    }

    #[tokio::test]
    async fn test_vanished_sink_does_not_fail_pipeline() {
        let (relay, mock, rx) = mock_relay();
        drop(rx);
        mock.queue_stream(vec![StreamEvent::Chunk("a".into()), StreamEvent::Done]);

        relay.start(SurfaceId(1), TaskKind::Check, "x".into());
        wait_until(|| relay.active_surfaces().is_empty()).await;
    }

    #[tokio::test]
    async fn test_translate_once_uses_one_shot_params() {
        let (relay, mock, _rx) = mock_relay();
        mock.queue_completion("Hello");

        let text = relay
            .translate_once("你好", Lang::Zh, Lang::En)
            .await
            .unwrap();
        assert_eq!(text, "Hello");

        let calls = mock.recorded_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(0.3));
        assert_eq!(calls[0].max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn test_translate_once_propagates_errors() {
        let (relay, mock, _rx) = mock_relay();
        mock.queue_completion_error(MockError::NotConfigured("no key".into()));

        let err = relay
            .translate_once("你好", Lang::Zh, Lang::En)
            .await
            .unwrap_err();
        assert!(matches!(err, GlotError::NotConfigured(_)));
    }
}
