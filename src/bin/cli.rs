use anyhow::{Context, Result};
use beatport4_source as lib;
use clap::{Parser, Subcommand};
use lib::api::prompt::{CredentialPrompt, EnvPrompt, StdinPrompt};
use lib::api::token::TokenManager;
use lib::api::MetadataSource;
use lib::config::Config;
use lib::source::BeatportSource;
use serde::Serialize;
use std::path::PathBuf;
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::rolling::RollingFileAppender;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "beatport4", version)]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read the token JSON from BEATPORT_TOKEN_JSON instead of the terminal
    #[arg(long)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Paste a Beatport token JSON and store it in the token file
    Auth,
    /// Show the account the stored token belongs to
    Whoami,
    /// Search album candidates
    Albums {
        artist: String,
        album: String,
        /// Treat as a various-artists release (artist left out of the query)
        #[arg(long)]
        va: bool,
    },
    /// Search track candidates
    Tracks { artist: String, title: String },
    /// Look up a release by Beatport id or URL
    Album { id: String },
    /// Look up a track by Beatport id or URL
    Track { id: String },
    /// Embed the Beatport cover of a track into an audio file
    Art { track_id: String, file: PathBuf },
    /// Validate config file and exit
    ConfigValidate,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Explicit --config wins; otherwise use <host config dir>/beatport4.toml
    // when present and the built-in defaults when not.
    let resolved_config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| lib::config::host_config_dir().join("beatport4.toml"));
    let cfg = if cli.config.is_some() || resolved_config_path.exists() {
        Config::from_path(&resolved_config_path)
            .with_context(|| format!("loading config from {}", resolved_config_path.display()))?
    } else {
        Config::default()
    };

    // Logs go to both stdout and a daily-rotated file in cfg.log_dir.
    let _ = LogTracer::init();
    std::fs::create_dir_all(&cfg.log_dir)
        .with_context(|| format!("creating log dir {}", cfg.log_dir.display()))?;
    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&cfg.log_dir, "beatport4.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Honor RUST_LOG if set, otherwise default to info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer().with_writer(non_blocking);
    let stdout_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);
    tracing_subscriber_global::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")?;

    let prompt: Box<dyn CredentialPrompt> = if cli.non_interactive {
        Box::new(EnvPrompt::default())
    } else {
        Box::new(StdinPrompt)
    };

    match cli.command {
        Commands::ConfigValidate => {
            println!("OK");
        }
        Commands::Auth => {
            let mut tokens = TokenManager::from_config(&cfg, prompt);
            tokens.prompt_for_token("Storing a new Beatport token.")?;
            println!("Saved token to {}", tokens.store().path().display());
        }
        Commands::Whoami => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            let account = source.setup().await?;
            println!("{} <{}>", account.username, account.email);
        }
        Commands::Albums { artist, album, va } => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            print_json(&source.candidates(&artist, &album, va).await?)?;
        }
        Commands::Tracks { artist, title } => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            print_json(&source.item_candidates(&artist, &title).await?)?;
        }
        Commands::Album { id } => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            match source.album_for_id(&id).await? {
                Some(album) => print_json(&album)?,
                None => {
                    eprintln!("No Beatport release for {}", id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Track { id } => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            match source.track_for_id(&id).await? {
                Some(track) => print_json(&track)?,
                None => {
                    eprintln!("No Beatport track for {}", id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Art { track_id, file } => {
            let source = BeatportSource::from_config(&cfg, prompt)?;
            let id = lib::util::parse_track_id(&track_id)
                .with_context(|| format!("not a Beatport track id: {}", track_id))?;
            let written = source.embed_art(id, &file).await?;
            println!("{}", if written { "embedded" } else { "skipped" });
        }
    }
    Ok(())
}
