//! Domain-specific error types for the reel synchronizer.
//!
//! All fallible operations return `Result<T, ReelError>`.
//! No panics on invalid input — every error is typed and recoverable.

use thiserror::Error;

/// The canonical error type for the reel synchronizer.
#[derive(Debug, Error)]
pub enum ReelError {
    // ── Timecode Errors ──────────────────────────────────────────
    /// A timecode string did not match `HH:MM:SS[:;.]FF` or had a
    /// component out of range. Callers recover by displaying the raw
    /// string instead.
    #[error("invalid timecode {input:?}: {reason}")]
    TimecodeParse {
        input: String,
        reason: &'static str,
    },

    // ── Protocol Errors ──────────────────────────────────────────
    /// The backend reported a connection-level failure. Surfaced to the
    /// user; the link is also closed to force a clean resynchronization.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The backend rejected a command. Surfaced to the user only.
    #[error("response failed: {0}")]
    ResponseFailed(String),

    // ── Envelope Errors ──────────────────────────────────────────
    /// A JSON envelope could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// An inbound line exceeded the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // ── Link Errors ──────────────────────────────────────────────
    /// The TCP/IO layer reported an error. Recovered automatically by
    /// the backoff reconnect loop.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ReelError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        ReelError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ReelError::TimecodeParse {
            input: "99:99".into(),
            reason: "bad shape",
        };
        assert!(e.to_string().contains("99:99"));

        let e = ReelError::FrameTooLarge {
            size: 100_000,
            max: 65_536,
        };
        assert!(e.to_string().contains("100000"));
        assert!(e.to_string().contains("65536"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: ReelError = io_err.into();
        assert!(matches!(e, ReelError::Connection(_)));
    }

    #[tokio::test]
    async fn from_send_error() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u32>(1);
        drop(rx);
        let send_err = tx.send(1).await.unwrap_err();
        let e: ReelError = send_err.into();
        assert!(matches!(e, ReelError::ChannelClosed));
    }
}
