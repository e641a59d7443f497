/// Errors that can occur while handing records to a destination.
///
/// # Examples
///
/// ```rust
/// use cachewatch_sink::error::SinkError;
///
/// let err = SinkError::Protocol("bad header".to_string());
/// assert!(err.to_string().contains("bad header"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The bounded queue has no free slot.
    #[error("Sink: queue is full")]
    QueueFull,

    /// The receiving side of the queue was dropped.
    #[error("Sink: queue is closed")]
    QueueClosed,

    /// Socket-level failure talking to a remote endpoint.
    #[error("Sink: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote endpoint did not answer within the configured timeout.
    #[error("Sink: timed out after {0}s")]
    Timeout(u64),

    /// The remote endpoint sent a frame we cannot decode.
    #[error("Sink: protocol error: {0}")]
    Protocol(String),

    /// The remote endpoint answered but refused the data.
    #[error("Sink: rejected by {endpoint}: {info}")]
    Rejected { endpoint: String, info: String },

    /// JSON serialization or deserialization failed.
    #[error("Sink: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience `Result` alias for destination operations.
pub type Result<T> = std::result::Result<T, SinkError>;
