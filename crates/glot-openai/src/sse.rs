//! SSE stream decoder for the Chat Completions API.
//!
//! Converts a raw `reqwest::Response` byte stream into a [`TextStream`]
//! of [`StreamEvent`]s. Bytes arrive at arbitrary split points, so the
//! decoder reassembles lines across reads: after each read, every
//! complete line is processed and any trailing partial line stays
//! buffered for the next read. UTF-8 sequences split across reads are
//! handled the same way.
//!
//! Termination is guaranteed exactly once per stream:
//! - a `data: [DONE]` frame ends decoding immediately, even if the
//!   transport has more bytes buffered or pending;
//! - a body that ends without the sentinel still yields a final
//!   [`Done`](StreamEvent::Done);
//! - a read error yields a single `Err` and nothing after it.
//!
//! Malformed frames and content-free heartbeats are skipped silently —
//! one bad line never aborts an otherwise healthy stream.

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use glot_core::{GlotError, StreamEvent, TextStream};

use crate::types::StreamChunk;

/// Maximum size for buffers before we abort the stream.
const MAX_BUF: usize = 16 * 1024 * 1024; // 16 MiB

/// Line prefix marking a payload-bearing SSE frame.
const DATA_PREFIX: &str = "data: ";

/// End-of-stream sentinel, distinct from transport EOF.
const DONE_SENTINEL: &str = "[DONE]";

/// Convert a reqwest SSE response into a [`TextStream`].
pub(crate) fn into_stream(response: reqwest::Response) -> TextStream {
    decode(response.bytes_stream().map_err(|e| GlotError::Http {
        status: None,
        message: format!("stream read error: {e}"),
    }))
}

/// Decode an SSE byte stream into a [`TextStream`].
///
/// Factored out of [`into_stream`] so tests can feed hand-built byte
/// sequences with precise split points.
fn decode<B>(bytes: B) -> TextStream
where
    B: Stream<Item = Result<Bytes, GlotError>> + Send + 'static,
{
    let stream = async_stream::stream! {
        futures::pin_mut!(bytes);
        let mut buffer = String::new();
        let mut utf8_buf: Vec<u8> = Vec::new();

        while let Some(read) = bytes.next().await {
            let chunk = match read {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            utf8_buf.extend_from_slice(&chunk);
            if utf8_buf.len() > MAX_BUF || buffer.len() > MAX_BUF {
                yield Err(GlotError::ResponseFormat {
                    message: "SSE stream buffer exceeded 16 MiB".into(),
                    raw: String::new(),
                });
                return;
            }
            append_valid_utf8(&mut buffer, &mut utf8_buf);

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim_end_matches('\r').to_string();
                buffer.drain(..=pos);

                match parse_line(&line) {
                    LineEvent::Chunk(text) => yield Ok(StreamEvent::Chunk(text)),
                    LineEvent::Done => {
                        yield Ok(StreamEvent::Done);
                        return;
                    }
                    LineEvent::Skip => {}
                }
            }
        }

        // The body ended without a [DONE] frame.
        yield Ok(StreamEvent::Done);
    };
    Box::pin(stream)
}

/// Move the longest valid UTF-8 prefix of `utf8_buf` into `buffer`.
///
/// An incomplete trailing sequence stays in `utf8_buf` until the next
/// read completes it; permanently invalid bytes are skipped.
fn append_valid_utf8(buffer: &mut String, utf8_buf: &mut Vec<u8>) {
    match std::str::from_utf8(utf8_buf) {
        Ok(text) => {
            buffer.push_str(text);
            utf8_buf.clear();
        }
        Err(e) => {
            let valid_up_to = e.valid_up_to();
            if valid_up_to > 0 {
                // SAFETY: `from_utf8` validated bytes up to this index
                // are valid UTF-8.
                let valid = unsafe { std::str::from_utf8_unchecked(&utf8_buf[..valid_up_to]) };
                buffer.push_str(valid);
            }
            match e.error_len() {
                None => {
                    utf8_buf.drain(..valid_up_to);
                }
                Some(len) => {
                    utf8_buf.drain(..valid_up_to + len);
                }
            }
        }
    }
}

/// What one complete line contributes to the stream.
#[derive(Debug, PartialEq, Eq)]
enum LineEvent {
    Chunk(String),
    Done,
    Skip,
}

/// Parse a single reassembled line.
fn parse_line(line: &str) -> LineEvent {
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return LineEvent::Skip;
    };
    if data == DONE_SENTINEL {
        return LineEvent::Done;
    }
    let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
        return LineEvent::Skip;
    };
    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(text) if !text.is_empty() => LineEvent::Chunk(text),
        _ => LineEvent::Skip,
    }
}
