//! Append-only conversation log.
//!
//! The log is a write-once record of the session. The context window sent
//! with each request is re-derived from it on every read rather than kept
//! as a separate rolling buffer.

use chrono::Utc;
use hearth_core::{Message, MessageDraft, MessageId};

/// Ordered, append-only sequence of messages for one session.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning its id and, if absent, its timestamp.
    pub fn append(&mut self, draft: MessageDraft) -> Message {
        self.next_id += 1;
        let message = Message {
            id: MessageId(self.next_id),
            role: draft.role,
            content: draft.content,
            emotion: draft.emotion,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
        };
        tracing::debug!(message_id = %message.id, role = %message.role, "Message appended");
        self.messages.push(message.clone());
        message
    }

    /// The last `k` messages in append order (fewer if the log is shorter).
    pub fn context_window(&self, k: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(k);
        self.messages[start..].to_vec()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
