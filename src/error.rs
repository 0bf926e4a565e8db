//! Error types surfaced by the client.
//!
//! Nothing here is fatal to a session: every variant maps to a short
//! user-facing notice and the operation that raised it is abandoned.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server or the push channel could not be reached, or rejected us
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local input was rejected before anything was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A device capability (location, microphone) is unavailable
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Wrong passphrase or damaged ciphertext
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bundling several attachments into one archive failed
    #[error("Archive error: {0}")]
    Archive(String),
}

impl ClientError {
    /// Text shown to the user when this error ends an operation.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(e) => format!("Server request failed: {}", e),
            ClientError::Validation(reason) => reason.clone(),
            ClientError::Permission(reason) => reason.clone(),
            ClientError::Crypto(CryptoError::IntegrityError) | ClientError::Crypto(CryptoError::MalformedError(_)) => {
                "Wrong passphrase".to_string()
            }
            ClientError::Crypto(e) => format!("Encryption failed: {}", e),
            ClientError::Io(e) => format!("Could not read file: {}", e),
            ClientError::Archive(_) => "Could not create archive".to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
