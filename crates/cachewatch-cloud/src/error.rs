use cachewatch_common::types::UnsupportedEngine;

/// Errors that can occur while polling the CloudWatch API.
///
/// An empty datapoint list is not an error; the fetcher skips such metrics.
///
/// # Examples
///
/// ```rust
/// use cachewatch_cloud::error::CloudWatchError;
///
/// let err = CloudWatchError::ConfigError("missing region".to_string());
/// assert!(err.to_string().contains("region"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CloudWatchError {
    /// The configured cache engine is not Redis or Memcached. Raised before any query.
    #[error(transparent)]
    UnsupportedEngine(#[from] UnsupportedEngine),

    /// Connection settings are missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP-level error: non-2xx status code without a parseable error body.
    #[error("CloudWatch API HTTP error: status={status}, body={body}")]
    HttpError { status: u16, body: String },

    /// The API rejected the request with a typed error payload.
    #[error("CloudWatch API error: code={code}, message={message}")]
    ApiResponseError { code: String, message: String },

    /// HMAC signing failed (invalid key length).
    #[error("HMAC signing error: {0}")]
    HmacError(String),

    /// An underlying HTTP transport error from `reqwest`.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CloudWatchError {
    /// Whether the error stems from configuration rather than transport.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CloudWatchError::UnsupportedEngine(_) | CloudWatchError::ConfigError(_)
        )
    }
}

/// Convenience type alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, CloudWatchError>;
