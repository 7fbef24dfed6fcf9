//! Error types for conversation sessions and the remote services.

use std::time::Duration;

/// Errors from the chat session and its remote collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a reply is already pending")]
    Busy,
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("session is closed")]
    SessionClosed,
}

impl ChatError {
    /// Whether resubmitting the same message may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_) | ChatError::Timeout(_) | ChatError::Server { .. }
        )
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}
