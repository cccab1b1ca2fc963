//! Unified error type for the assist pipeline.
//!
//! Every layer — client, decoder, relay — maps its failures into
//! [`GlotError`], giving callers a single type to match against.
//!
//! # Cancellation is not a failure
//!
//! A cooperatively aborted request surfaces as [`GlotError::Cancelled`].
//! Callers that report errors to a user should check
//! [`is_cancellation`](GlotError::is_cancellation) first and stay quiet
//! for intentional aborts:
//!
//! ```rust
//! use glot_core::GlotError;
//!
//! fn should_report(err: &GlotError) -> bool {
//!     !err.is_cancellation()
//! }
//! ```

/// The unified error type returned by all pipeline operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GlotError {
    /// A required credential or setting is missing. Raised before any
    /// network I/O is attempted; not retryable.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// The provider answered with a non-2xx status. `message` carries
    /// the provider's own error text when the body was parseable, or a
    /// generic `request failed: <status>` otherwise.
    #[error("API error (status={status}): {message}")]
    Api {
        /// The HTTP status the provider returned.
        status: http::StatusCode,
        /// A human-readable description of the failure.
        message: String,
    },

    /// An HTTP-level failure (connect error, reset, mid-stream read
    /// error). `status` is `None` when no response was ever received.
    #[error("HTTP error (status={status:?}): {message}")]
    Http {
        /// The HTTP status code, if one was received.
        status: Option<http::StatusCode>,
        /// A human-readable description of the failure.
        message: String,
    },

    /// The request exceeded its configured deadline.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the timeout fired.
        elapsed_ms: u64,
    },

    /// The response body could not be parsed.
    #[error("response format error: {message}")]
    ResponseFormat {
        /// What went wrong during parsing.
        message: String,
        /// The raw response body, for diagnostics.
        raw: String,
    },

    /// The request was aborted through its cancellation token. This is
    /// expected control flow, not a failure — see the module docs.
    #[error("request cancelled")]
    Cancelled,
}

impl GlotError {
    /// Returns `true` if this error represents an intentional abort
    /// rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for GlotError {
    fn from(err: serde_json::Error) -> Self {
        Self::ResponseFormat {
            message: err.to_string(),
            raw: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_configured() {
        let err = GlotError::NotConfigured("API key is not set".into());
        assert!(format!("{err}").contains("API key is not set"));
    }

    #[test]
    fn test_display_api() {
        let err = GlotError::Api {
            status: http::StatusCode::UNAUTHORIZED,
            message: "invalid key".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("401"));
        assert!(display.contains("invalid key"));
    }

    #[test]
    fn test_display_http_without_status() {
        let err = GlotError::Http {
            status: None,
            message: "connection reset".into(),
        };
        assert!(format!("{err}").contains("connection reset"));
    }

    #[test]
    fn test_display_timeout() {
        let err = GlotError::Timeout { elapsed_ms: 5000 };
        assert!(format!("{err}").contains("5000"));
    }

    #[test]
    fn test_is_cancellation() {
        assert!(GlotError::Cancelled.is_cancellation());
        assert!(!GlotError::Timeout { elapsed_ms: 1 }.is_cancellation());
        assert!(!GlotError::NotConfigured("x".into()).is_cancellation());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GlotError = json_err.into();
        assert!(matches!(err, GlotError::ResponseFormat { .. }));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GlotError>();
    }
}
