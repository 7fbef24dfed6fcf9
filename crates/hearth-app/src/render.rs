//! Plain-text rendering for the terminal front-end.

use hearth_chat::{ConversationRecord, HistoryPage, SessionSnapshot, SessionState};
use hearth_core::{Message, Persona, Role};

/// One line per persona: avatar, label and tagline.
pub fn persona_line(persona: Persona) -> String {
    let profile = persona.profile();
    format!(
        "{} {:<8} {:<8} {}",
        profile.avatar,
        persona.as_str(),
        profile.label,
        profile.tagline
    )
}

/// A conversation message as shown in the transcript.
///
/// Neutral emotion tags are not shown.
pub fn message_line(persona: Persona, message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You".to_string(),
        Role::Assistant => format!("{} {}", persona.profile().avatar, persona.profile().label),
    };
    let time = message.created_at.format("%H:%M");
    match message.emotion.as_ref().filter(|e| !e.is_neutral()) {
        Some(emotion) => format!("[{}] {}: {} ({})", time, speaker, message.content, emotion),
        None => format!("[{}] {}: {}", time, speaker, message.content),
    }
}

/// Status line shown when the session state or voice flags change.
pub fn status_line(snapshot: &SessionSnapshot) -> Option<String> {
    let mut parts = Vec::new();
    match &snapshot.state {
        SessionState::AwaitingResponse => parts.push("typing...".to_string()),
        SessionState::Error(reason) => parts.push(format!("! {}", reason)),
        SessionState::Idle => {}
    }
    if let Some(notice) = &snapshot.notice {
        if snapshot.state.error() != Some(notice) {
            parts.push(format!("! {}", notice));
        }
    }
    if snapshot.listening {
        parts.push("listening".to_string());
    }
    if snapshot.speaking {
        parts.push("speaking".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// A stored exchange: the user's message and the persona's answer.
pub fn history_record(record: &ConversationRecord) -> String {
    let who = match record.persona() {
        Some(persona) => persona.profile().label.to_string(),
        None => record.relation_type.clone(),
    };
    let when = record
        .recorded_at()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string());
    let mut out = format!(
        "#{} {} with {}\n  You: {}\n  {}: {}",
        record.id, when, who, record.message, who, record.response
    );
    if let Some(emotion) = record.emotion.as_ref().filter(|e| !e.is_neutral()) {
        out.push_str(&format!(" ({})", emotion));
    }
    out
}

pub fn history_page(page: &HistoryPage, offset: u32) -> String {
    if page.items.is_empty() {
        return "No conversations yet.".to_string();
    }
    let mut out: Vec<String> = page.items.iter().map(history_record).collect();
    let last = offset as u64 + page.items.len() as u64;
    out.push(format!("Showing {}-{} of {}", offset as u64 + 1, last, page.total));
    out.join("\n")
}

pub const HELP: &str = "\
Commands:
  /mic               start or stop voice input
  /voice             turn spoken replies on or off
  /history [persona] show recent conversations
  /help              show this help
  /quit              leave the conversation
Anything else is sent as a message.";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hearth_chat::ErrorReason;
    use hearth_core::{EmotionTag, MessageId};

    fn message(role: Role, content: &str, emotion: Option<&str>) -> Message {
        Message {
            id: MessageId(1),
            role,
            content: content.to_string(),
            emotion: emotion.map(EmotionTag::new),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap(),
        }
    }

    fn snapshot(state: SessionState) -> SessionSnapshot {
        SessionSnapshot {
            state,
            notice: None,
            listening: false,
            speaking: false,
            voice_enabled: true,
            message_count: 1,
        }
    }

    #[test]
    fn test_message_line_assistant_with_emotion() {
        let line = message_line(
            Persona::Father,
            &message(Role::Assistant, "Proud of you.", Some("proud")),
        );
        assert!(line.starts_with("[09:05] "));
        assert!(line.contains("Dad: Proud of you. (proud)"));
    }

    #[test]
    fn test_message_line_hides_neutral_emotion() {
        let line = message_line(
            Persona::Mother,
            &message(Role::Assistant, "ok", Some("neutral")),
        );
        assert!(line.ends_with("Mom: ok"));
    }

    #[test]
    fn test_message_line_user() {
        let line = message_line(Persona::Mother, &message(Role::User, "hi mom", None));
        assert_eq!(line, "[09:05] You: hi mom");
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(&snapshot(SessionState::Idle)), None);
        assert_eq!(
            status_line(&snapshot(SessionState::AwaitingResponse)).as_deref(),
            Some("typing...")
        );
        let mut errored = snapshot(SessionState::Error(ErrorReason::Timeout));
        errored.notice = None;
        errored.speaking = true;
        assert_eq!(
            status_line(&errored).as_deref(),
            Some("! The reply took too long. Please try again. | speaking")
        );
    }

    #[test]
    fn test_status_line_notice_while_awaiting() {
        let mut awaiting = snapshot(SessionState::AwaitingResponse);
        awaiting.notice = Some(ErrorReason::Unsupported);
        assert_eq!(
            status_line(&awaiting).as_deref(),
            Some("typing... | ! Voice input is not supported here.")
        );
    }

    #[test]
    fn test_persona_line() {
        let line = persona_line(Persona::Sister);
        assert!(line.contains("sister"));
        assert!(line.contains("Your best friend who gets it"));
    }

    #[test]
    fn test_history_page_empty() {
        let page = HistoryPage {
            items: Vec::new(),
            total: 0,
        };
        assert_eq!(history_page(&page, 0), "No conversations yet.");
    }

    #[test]
    fn test_history_page_footer() {
        let record = ConversationRecord {
            id: 9,
            user_id: None,
            relation_type: "brother".to_string(),
            message: "sup".to_string(),
            response: "not much!".to_string(),
            emotion: Some(EmotionTag::new("playful")),
            timestamp: Some("2024-05-01T18:30:00".to_string()),
        };
        let page = HistoryPage {
            items: vec![record],
            total: 12,
        };
        let text = history_page(&page, 10);
        assert!(text.contains("#9 2024-05-01 18:30 with Brother"));
        assert!(text.contains("Brother: not much! (playful)"));
        assert!(text.ends_with("Showing 11-11 of 12"));
    }
}
