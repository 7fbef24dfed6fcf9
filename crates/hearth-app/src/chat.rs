//! Interactive conversation loop on stdin/stdout.
//!
//! Typed lines and session events are multiplexed on one task, so the
//! session is only ever touched from here.

use std::sync::Arc;

use hearth_chat::{
    HistoryQuery, HistoryService, HttpChatBackend, HttpHistoryClient, SessionController,
    SessionOptions, SubmitOutcome,
};
use hearth_core::{HearthConfig, Persona};
use hearth_speech::{SayCommandOutput, UnsupportedSpeechInput};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Say(String),
    Mic,
    Voice,
    History(Option<String>),
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Say(line.to_string());
        };
        let mut words = rest.split_whitespace();
        match words.next().unwrap_or("") {
            "mic" => ReplCommand::Mic,
            "voice" => ReplCommand::Voice,
            "history" => ReplCommand::History(words.next().map(str::to_string)),
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" | "bye" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

/// Run a conversation with `persona` until the user quits or stdin closes.
pub async fn run(
    config: &HearthConfig,
    persona: Persona,
    mute: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = HttpChatBackend::new(&config.backend.base_url, config.backend.timeout())?;
    let history = HttpHistoryClient::new(&config.backend.base_url, config.backend.timeout())?;
    let output = SayCommandOutput::discover(&config.voice.say_command).await;

    let mut options = SessionOptions::from_config(config);
    if mute {
        options.voice_enabled = false;
    }
    let mut session = SessionController::open(
        persona,
        Arc::new(backend),
        Arc::new(UnsupportedSpeechInput),
        Arc::new(output),
        options,
    );

    let profile = persona.profile();
    println!("{} {}: {}", profile.avatar, profile.label, profile.tagline);
    println!("Type /help for commands.\n");

    let mut shown = 0;
    let mut last_status = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        shown = print_new_messages(&session, shown);
        let status = render::status_line(&session.snapshot());
        if status != last_status {
            if let Some(text) = &status {
                println!("  ({})", text);
            }
            last_status = status;
        }

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ReplCommand::parse(&line) {
                    ReplCommand::Say(text) => {
                        if let SubmitOutcome::Rejected(reason) = session.submit(&text) {
                            tracing::debug!(?reason, "Submission not sent");
                        }
                    }
                    ReplCommand::Mic => session.toggle_voice_input(),
                    ReplCommand::Voice => {
                        let enabled = session.toggle_voice_output();
                        println!("  (spoken replies {})", if enabled { "on" } else { "off" });
                    }
                    ReplCommand::History(filter) => {
                        show_history(&history, config, filter.as_deref()).await;
                    }
                    ReplCommand::Help => println!("{}", render::HELP),
                    ReplCommand::Quit => break,
                    ReplCommand::Unknown(name) => {
                        println!("  Unknown command /{}. Type /help for commands.", name);
                    }
                }
            }
            Some(event) = session.next_event() => session.handle_event(event),
        }
    }

    session.close();
    println!("{} {}: Take care. Talk soon!", profile.avatar, profile.label);
    Ok(())
}

fn print_new_messages(session: &SessionController, shown: usize) -> usize {
    let messages = session.messages();
    for message in &messages[shown.min(messages.len())..] {
        println!("{}", render::message_line(session.persona(), message));
    }
    messages.len()
}

async fn show_history(history: &HttpHistoryClient, config: &HearthConfig, filter: Option<&str>) {
    let persona = match filter.map(str::parse::<Persona>) {
        Some(Ok(persona)) => Some(persona),
        Some(Err(e)) => {
            println!("  {}", e);
            return;
        }
        None => None,
    };
    let query = HistoryQuery {
        persona,
        user_id: config.backend.user_id,
        limit: config.history.page_size,
        offset: 0,
    };
    match history.fetch(&query).await {
        Ok(page) => println!("{}", render::history_page(&page, 0)),
        Err(e) => {
            tracing::warn!(error = %e, "History lookup failed");
            println!("  Could not load history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            ReplCommand::parse("  hello mom "),
            ReplCommand::Say("hello mom".to_string())
        );
        assert_eq!(ReplCommand::parse(""), ReplCommand::Say(String::new()));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("/mic"), ReplCommand::Mic);
        assert_eq!(ReplCommand::parse("/voice"), ReplCommand::Voice);
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/help"), ReplCommand::Help);
        assert_eq!(ReplCommand::parse("/history"), ReplCommand::History(None));
        assert_eq!(
            ReplCommand::parse("/history father"),
            ReplCommand::History(Some("father".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            ReplCommand::parse("/dance"),
            ReplCommand::Unknown("dance".to_string())
        );
        assert_eq!(ReplCommand::parse("/"), ReplCommand::Unknown(String::new()));
    }
}
