//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while talking to the chat server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never got a response.
    #[error("Failed to reach {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("Server returned {status} for {url}")]
    BadStatus { url: String, status: u16 },

    /// The response body was not what we expected.
    #[error("Failed to parse response from {url}: {message}")]
    ParseError { url: String, message: String },

    /// The push channel could not be opened or was lost.
    #[error("Push channel error: {0}")]
    Channel(String),

    /// The configured server URL is unusable.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}
