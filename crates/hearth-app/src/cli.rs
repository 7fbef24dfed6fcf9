//! CLI argument definitions for the Hearth terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use hearth_core::Persona;
use std::path::PathBuf;

/// Hearth: talk to a caring family member from your terminal.
#[derive(Parser, Debug)]
#[command(name = "hearth", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Base URL of the chat service API.
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a conversation (mother, father, brother or sister).
    Chat {
        persona: Option<String>,

        /// Start with spoken replies off.
        #[arg(long)]
        mute: bool,
    },
    /// Show past conversations.
    History {
        #[arg(short = 'p', long = "persona")]
        persona: Option<Persona>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Register a user with the chat service and save its id to the config.
    Register { name: String },
    /// List the family members you can talk to.
    Personas,
}

impl CliArgs {
    /// The subcommand to run; a bare `hearth` opens a chat.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat {
            persona: None,
            mute: false,
        })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HEARTH_CONFIG env var > ~/.hearth/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HEARTH_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL.
    ///
    /// Priority: --base-url flag > HEARTH_BASE_URL env var > config file value.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("HEARTH_BASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config_url.to_string()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".hearth").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".hearth").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation_opens_chat() {
        let args = CliArgs::try_parse_from(["hearth"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Chat {
                persona: None,
                mute: false
            }
        );
    }

    #[test]
    fn test_chat_with_persona() {
        let args = CliArgs::try_parse_from(["hearth", "chat", "father", "--mute"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Chat {
                persona: Some("father".to_string()),
                mute: true
            }
        );
    }

    #[test]
    fn test_history_parses_persona() {
        let args =
            CliArgs::try_parse_from(["hearth", "history", "-p", "Sister", "--limit", "5"]).unwrap();
        assert_eq!(
            args.command(),
            Command::History {
                persona: Some(Persona::Sister),
                limit: Some(5),
                offset: 0
            }
        );
    }

    #[test]
    fn test_history_rejects_unknown_persona() {
        assert!(CliArgs::try_parse_from(["hearth", "history", "--persona", "uncle"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "hearth",
            "personas",
            "--config",
            "/tmp/hearth.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/hearth.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.command(), Command::Personas);
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::try_parse_from(["hearth"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_base_url_flag_wins() {
        let args =
            CliArgs::try_parse_from(["hearth", "--base-url", "http://example.test/api"]).unwrap();
        assert_eq!(
            args.resolve_base_url("http://localhost:8000/api"),
            "http://example.test/api"
        );
    }
}
