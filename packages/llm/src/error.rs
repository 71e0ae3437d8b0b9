//! Error type for the chat-completion client.

use thiserror::Error;

/// Errors that make the generation backend unavailable for a request.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend answered with a non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response carried no usable message content.
    #[error("empty completion: {0}")]
    EmptyCompletion(String),

    /// Transport failure (DNS, refused connection, timeout, bad body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GenerationError {
    /// Check whether the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Network(e) if e.is_timeout())
    }
}
