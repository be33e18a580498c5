//! Error types for the karaoke client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the presented token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The configured server URL cannot be parsed
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
