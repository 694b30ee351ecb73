//! voxchain CLI
//!
//! Talks to a language model by text or by recorded speech, optionally
//! speaking the replies back as WAV files.

#![allow(clippy::print_stdout)]

mod config;
mod playback;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;

/// voxchain CLI
#[derive(Parser)]
#[command(name = "voxchain")]
#[command(author, version, about = "Voice conversation pipeline: speech to text, chat, text to speech", long_about = None)]
struct Cli {
    /// Verbosity level (overrides the configured log filter)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (default: ./voxchain.toml when present)
    #[arg(short, long, env = "VOXCHAIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat by text
    ///
    /// Without a message, reads one message per line from stdin.
    /// Example: voxchain chat "What's the weather like on Mars?"
    Chat {
        /// Single message to send
        message: Option<String>,

        /// Do not synthesize replies
        #[arg(long)]
        text_only: bool,

        /// Directory for synthesized replies
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Speak to the model with recorded WAV files, one turn per file
    ///
    /// Example: voxchain converse question.wav follow-up.wav -o replies/
    Converse {
        /// Recordings to send, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Do not synthesize replies
        #[arg(long)]
        text_only: bool,

        /// Directory for synthesized replies
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a configuration file with every default filled in
    InitConfig,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::InitConfig) {
        print!("{}", AppConfig::template()?);
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.verbose > 0 {
        config.telemetry.log_filter = log_filter_from_verbosity(cli.verbose).to_string();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    infrastructure::init_tracing(&config.telemetry)?;

    info!(
        llm = %config.inference.provider,
        model = config.inference.resolved_model(),
        "Starting voxchain"
    );

    match cli.command {
        Commands::Chat {
            message,
            text_only,
            output,
        } => {
            if text_only {
                config.pipeline.synthesize_replies = false;
            }
            let orchestrator = session::text_pipeline(&config, output.as_deref())?;
            match message {
                Some(message) => session::chat_once(&orchestrator, &message).await?,
                None => session::chat_loop(&orchestrator).await?,
            }
        },

        Commands::Converse {
            inputs,
            text_only,
            output,
        } => {
            if text_only {
                config.pipeline.synthesize_replies = false;
            }
            session::converse_files(&config, &inputs, output.as_deref()).await?;
        },

        Commands::InitConfig => {},
    }

    Ok(())
}
