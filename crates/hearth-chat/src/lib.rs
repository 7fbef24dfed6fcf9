//! Conversation sessions for Hearth.
//!
//! Provides the append-only conversation log, the remote chat and history
//! clients, and the session controller that coordinates typed and spoken
//! input with remote replies and spoken output.

pub mod backend;
pub mod error;
pub mod fake;
pub mod history;
mod http;
pub mod session;
pub mod state;
pub mod store;

pub use backend::{ChatBackend, ChatReply, ChatRequest, ContextTurn, HttpChatBackend};
pub use error::ChatError;
pub use fake::{ScriptedChatBackend, ScriptedReply};
pub use history::{
    ConversationRecord, HistoryPage, HistoryQuery, HistoryService, HttpHistoryClient, UserProfile,
};
pub use session::{SessionController, SessionEvent, SessionOptions};
pub use state::{
    ErrorReason, RejectReason, SessionSnapshot, SessionState, SubmitOutcome, VoiceSettings,
};
pub use store::ConversationStore;
