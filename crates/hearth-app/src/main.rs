mod chat;
mod cli;
mod render;

use std::path::Path;

use clap::Parser;
use hearth_chat::{HistoryQuery, HistoryService, HttpHistoryClient};
use hearth_core::{HearthConfig, Persona};

use cli::{CliArgs, Command};

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file, falling back to defaults when it is missing.
///
/// Runs before the real subscriber exists, so load problems go to a
/// temporary stderr logger at warn level.
fn load_config(path: &Path) -> HearthConfig {
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(bootstrap, || HearthConfig::load_or_default(path))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let mut config = load_config(&config_path);

    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!("Starting Hearth v{}", env!("CARGO_PKG_VERSION"));
    config.backend.base_url = args.resolve_base_url(&config.backend.base_url);
    tracing::debug!(base_url = %config.backend.base_url, "Chat service");

    match args.command() {
        Command::Chat { persona, mute } => {
            let persona = match persona {
                Some(raw) => {
                    let persona = Persona::parse_or_default(&raw);
                    if persona.as_str() != raw.trim().to_ascii_lowercase() {
                        tracing::warn!(requested = %raw, using = %persona, "Unknown persona");
                    }
                    persona
                }
                None => config.session.default_persona,
            };
            chat::run(&config, persona, mute).await?;
        }
        Command::History {
            persona,
            limit,
            offset,
        } => {
            let client =
                HttpHistoryClient::new(&config.backend.base_url, config.backend.timeout())?;
            let query = HistoryQuery {
                persona,
                user_id: config.backend.user_id,
                limit: limit.unwrap_or(config.history.page_size),
                offset,
            };
            let page = client.fetch(&query).await?;
            println!("{}", render::history_page(&page, offset));
        }
        Command::Register { name } => {
            let client =
                HttpHistoryClient::new(&config.backend.base_url, config.backend.timeout())?;
            let user = client.create_user(&name).await?;
            println!("Registered {} with id {}.", user.name, user.id);

            // Re-read so flag and env overrides are not written back.
            let mut stored = HearthConfig::load_or_default(&config_path);
            stored.backend.user_id = Some(user.id);
            stored.save(&config_path)?;
            println!("Saved user_id {} to {}.", user.id, config_path.display());
        }
        Command::Personas => {
            for persona in Persona::ALL {
                println!("{}", render::persona_line(persona));
            }
        }
    }

    Ok(())
}
