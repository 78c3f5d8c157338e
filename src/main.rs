use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "chorus")]
#[command(about = "One chat stream for Claude Code, Codex, Gemini and Copilot")]
#[command(version)]
struct Cli {
    /// Path to the workspace (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (defaults to .chorus/config.toml in the workspace)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message to a provider and stream the answer
    Chat(cli::chat::ChatArgs),

    /// Ask several providers at once and synthesize one answer
    Brainstorm {
        /// Run review rounds before synthesis
        #[arg(long)]
        full: bool,

        /// Number of review rounds (implies --full)
        #[arg(long)]
        rounds: Option<u32>,

        /// Print stream events as JSON lines
        #[arg(long)]
        json: bool,

        /// The question to brainstorm
        query: String,
    },

    /// Show installation and login state of every provider
    Providers {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new .chorus/config.toml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the streamed answer
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Chat(args) => {
            cli::chat::chat_command(&work_dir, config_path, args).await?;
        }
        Commands::Brainstorm {
            full,
            rounds,
            json,
            query,
        } => {
            cli::brainstorm::brainstorm_command(&work_dir, config_path, &query, full, rounds, json)
                .await?;
        }
        Commands::Providers { json } => {
            cli::providers::providers_command(&work_dir, config_path, json).await?;
        }
        Commands::Init { force } => {
            cli::init::init_command(&work_dir, force).await?;
        }
    }

    Ok(())
}
