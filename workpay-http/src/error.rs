//! HTTP transport error types.

/// Errors in HTTP-level encoding or client construction.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// JSON serialization or deserialization failed.
    #[error("serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The underlying HTTP client could not be built.
    #[error("http client: {0}")]
    Client(String),
}
