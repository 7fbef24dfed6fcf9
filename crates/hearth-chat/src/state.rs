//! Session state machine types.

use std::fmt;

use hearth_core::MessageId;
use hearth_speech::SpeechError;
use serde::Serialize;

use crate::error::ChatError;

/// Why the session last failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorReason {
    /// Voice capture is not available here.
    Unsupported,
    /// Microphone or synthesizer failure.
    Device(String),
    /// The chat service could not be reached or answered garbage.
    Network(String),
    /// The chat service did not answer in time.
    Timeout,
    /// The chat service answered with a non-success status.
    Server(u16),
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorReason::Unsupported => write!(f, "Voice input is not supported here."),
            ErrorReason::Device(detail) => write!(f, "Microphone problem: {}", detail),
            ErrorReason::Network(_) => {
                write!(f, "Sorry, I couldn't reach the server. Please try again.")
            }
            ErrorReason::Timeout => write!(f, "The reply took too long. Please try again."),
            ErrorReason::Server(status) => {
                write!(f, "The server had a problem ({}). Please try again.", status)
            }
        }
    }
}

impl From<&SpeechError> for ErrorReason {
    fn from(err: &SpeechError) -> Self {
        match err {
            SpeechError::Unsupported => ErrorReason::Unsupported,
            other => ErrorReason::Device(other.to_string()),
        }
    }
}

impl From<&ChatError> for ErrorReason {
    fn from(err: &ChatError) -> Self {
        match err {
            ChatError::Timeout(_) => ErrorReason::Timeout,
            ChatError::Server { status, .. } => ErrorReason::Server(*status),
            other => ErrorReason::Network(other.to_string()),
        }
    }
}

/// Where the session is in its request cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for input.
    #[default]
    Idle,
    /// A request is outstanding; further submissions are refused.
    AwaitingResponse,
    /// The last request or capture failed. Accepts input like `Idle`.
    Error(ErrorReason),
}

impl SessionState {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, SessionState::AwaitingResponse)
    }

    pub fn error(&self) -> Option<&ErrorReason> {
        match self {
            SessionState::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingResponse => write!(f, "awaiting_response"),
            SessionState::Error(_) => write!(f, "error"),
        }
    }
}

/// Why a submission was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing left after trimming whitespace.
    Empty,
    /// A reply is still outstanding.
    Busy,
    /// The session has been closed.
    Closed,
}

impl From<RejectReason> for ChatError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::Empty => ChatError::EmptyMessage,
            RejectReason::Busy => ChatError::Busy,
            RejectReason::Closed => ChatError::SessionClosed,
        }
    }
}

/// Result of [`SessionController::submit`](crate::SessionController::submit).
///
/// Rejections leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { ticket: u64, message_id: MessageId },
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }
}

/// Whether replies are spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSettings {
    pub enabled: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Most recent voice problem, kept even while a reply is outstanding.
    pub notice: Option<ErrorReason>,
    pub listening: bool,
    pub speaking: bool,
    pub voice_enabled: bool,
    pub message_count: usize,
}
