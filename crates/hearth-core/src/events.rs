use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, Persona, Role, SessionId};

/// Domain events emitted by a conversation session.
///
/// Published after the state change they describe and consumed by:
/// - front-ends rendering session progress
/// - the log, for debugging
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    // =========================================================================
    // Session lifecycle
    // =========================================================================
    /// A session was opened and seeded with its greeting.
    SessionOpened {
        session_id: SessionId,
        persona: Persona,
        timestamp: DateTime<Utc>,
    },

    /// A session was torn down.
    SessionClosed {
        session_id: SessionId,
        message_count: usize,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Conversation
    // =========================================================================
    /// A message was appended to the conversation log.
    MessageAppended {
        session_id: SessionId,
        message_id: MessageId,
        role: Role,
        timestamp: DateTime<Utc>,
    },

    /// A submission was accepted and a remote request issued.
    SubmissionAccepted {
        session_id: SessionId,
        ticket: u64,
        context_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// The remote service answered the outstanding request.
    ReplyReceived {
        session_id: SessionId,
        ticket: u64,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The outstanding request failed.
    SubmissionFailed {
        session_id: SessionId,
        ticket: u64,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A reply arrived for a request that is no longer outstanding.
    StaleReplyDiscarded {
        session_id: SessionId,
        ticket: u64,
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Voice
    // =========================================================================
    /// Voice capture began.
    ListeningStarted {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// Voice capture ended (result, error or cancel).
    ListeningStopped {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// A reply is being spoken.
    SpeechStarted {
        session_id: SessionId,
        message_id: MessageId,
        timestamp: DateTime<Utc>,
    },

    /// Speech output was silenced.
    SpeechStopped {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// The user switched spoken replies on or off.
    VoiceOutputToggled {
        session_id: SessionId,
        enabled: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::SessionOpened { timestamp, .. }
            | DomainEvent::SessionClosed { timestamp, .. }
            | DomainEvent::MessageAppended { timestamp, .. }
            | DomainEvent::SubmissionAccepted { timestamp, .. }
            | DomainEvent::ReplyReceived { timestamp, .. }
            | DomainEvent::SubmissionFailed { timestamp, .. }
            | DomainEvent::StaleReplyDiscarded { timestamp, .. }
            | DomainEvent::ListeningStarted { timestamp, .. }
            | DomainEvent::ListeningStopped { timestamp, .. }
            | DomainEvent::SpeechStarted { timestamp, .. }
            | DomainEvent::SpeechStopped { timestamp, .. }
            | DomainEvent::VoiceOutputToggled { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the session the event belongs to.
    pub fn session_id(&self) -> SessionId {
        match self {
            DomainEvent::SessionOpened { session_id, .. }
            | DomainEvent::SessionClosed { session_id, .. }
            | DomainEvent::MessageAppended { session_id, .. }
            | DomainEvent::SubmissionAccepted { session_id, .. }
            | DomainEvent::ReplyReceived { session_id, .. }
            | DomainEvent::SubmissionFailed { session_id, .. }
            | DomainEvent::StaleReplyDiscarded { session_id, .. }
            | DomainEvent::ListeningStarted { session_id, .. }
            | DomainEvent::ListeningStopped { session_id, .. }
            | DomainEvent::SpeechStarted { session_id, .. }
            | DomainEvent::SpeechStopped { session_id, .. }
            | DomainEvent::VoiceOutputToggled { session_id, .. } => *session_id,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::SessionOpened { .. } => "session_opened",
            DomainEvent::SessionClosed { .. } => "session_closed",
            DomainEvent::MessageAppended { .. } => "message_appended",
            DomainEvent::SubmissionAccepted { .. } => "submission_accepted",
            DomainEvent::ReplyReceived { .. } => "reply_received",
            DomainEvent::SubmissionFailed { .. } => "submission_failed",
            DomainEvent::StaleReplyDiscarded { .. } => "stale_reply_discarded",
            DomainEvent::ListeningStarted { .. } => "listening_started",
            DomainEvent::ListeningStopped { .. } => "listening_stopped",
            DomainEvent::SpeechStarted { .. } => "speech_started",
            DomainEvent::SpeechStopped { .. } => "speech_stopped",
            DomainEvent::VoiceOutputToggled { .. } => "voice_output_toggled",
        }
    }
}
