// src/main.rs
// persona-preview: compose instruction text from a JSON state fixture

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use persona_engine::mood::InteractionSignal;
use persona_engine::prompt::{CompositionMode, ToolHint};
use persona_engine::spontaneity::TurnSituation;
use persona_engine::{
    CONFIG, Clock, CompositionRequest, EngineConfig, InMemoryStore, ManualClock, PersonaService, SystemClock,
};

#[derive(Parser)]
#[command(name = "persona-preview")]
#[command(about = "Preview the persona instruction text for a stored user state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file; PERSONA_* environment variables are applied on top
    #[arg(short, long, global = true, env = "PERSONA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the instruction text for one user
    Compose {
        /// JSON fixture: { "<user_id>": { relationship, open_loops, threads, promises } }
        fixture: PathBuf,

        /// User to compose for
        #[arg(short, long)]
        user: String,

        /// first-contact or mid
        #[arg(short, long, default_value = "first-contact")]
        mode: String,

        /// Pretend it is this instant (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// JSON array of interaction signals to replay into the session first
        #[arg(long)]
        signals: Option<PathBuf>,

        /// Where the persona is right now
        #[arg(long)]
        location: Option<String>,

        /// What the persona is doing right now
        #[arg(long)]
        activity: Option<String>,

        /// The user mentioned having a bad day
        #[arg(long)]
        bad_day: bool,

        /// Available tool as name=description (repeatable)
        #[arg(long = "tool")]
        tools: Vec<String>,

        /// Also roll the spontaneity and selfie dice and report the outcome
        #[arg(long)]
        roll: bool,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            dotenvy::dotenv().ok();
            EngineConfig::load(path).with_env_overrides()
        }
        None => CONFIG.clone(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn parse_tool(raw: &str) -> ToolHint {
    match raw.split_once('=') {
        Some((name, description)) => ToolHint {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        },
        None => ToolHint {
            name: raw.trim().to_string(),
            description: String::new(),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the composed text can be piped
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Compose {
            fixture,
            user,
            mode,
            at,
            signals,
            location,
            activity,
            bad_day,
            tools,
            roll,
        } => {
            let mode = CompositionMode::parse(&mode)
                .with_context(|| format!("unknown mode '{mode}', expected first-contact or mid"))?;

            let json = std::fs::read_to_string(&fixture)
                .with_context(|| format!("failed to read fixture {}", fixture.display()))?;
            let store = InMemoryStore::from_json(&json).context("invalid fixture")?;

            let clock: Arc<dyn Clock> = match at {
                Some(at) => Arc::new(ManualClock::new(at)),
                None => Arc::new(SystemClock),
            };
            let service = PersonaService::new(Arc::new(store), clock, Arc::new(config));
            let mut session = service.start_session(&user);

            if let Some(path) = signals {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read signals {}", path.display()))?;
                let signals: Vec<InteractionSignal> = serde_json::from_str(&raw).context("invalid signals")?;
                info!(count = signals.len(), "Replaying interaction signals");
                for signal in signals {
                    service.record_interaction_signal(&mut session, signal);
                }
            }

            let request = CompositionRequest::new(mode)
                .with_situation(TurnSituation {
                    user_had_bad_day: bad_day,
                    location,
                    activity,
                    last_selfie_at: None,
                })
                .with_tools(tools.iter().map(String::as_str).map(parse_tool).collect());

            let preview = service.preview_turn(&session, &request).await;
            println!("{}", preview.text);

            if roll {
                eprintln!(
                    "tier={} mood={} spontaneity={:.3} ({}) selfie={:.3} ({})",
                    preview.tier,
                    preview.mood.label,
                    preview.spontaneity.spontaneity_probability,
                    if preview.spontaneity.roll_spontaneous() { "fires" } else { "holds" },
                    preview.spontaneity.selfie_probability,
                    if preview.spontaneity.roll_selfie() { "fires" } else { "holds" },
                );
            }
        }
    }

    Ok(())
}
