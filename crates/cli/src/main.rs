//! cvrag CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive conversation about the indexed CV
//! - `ask`: Answer a single question and exit
//! - `doctor`: Diagnose configuration, credentials and index

use clap::{Parser, Subcommand};
use cvrag_core::Language;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "cvrag",
    about = "cvrag — ask questions about a CV, grounded in its indexed text",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.cvrag/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive conversation
    Chat {
        /// Answer language (pt or en); defaults to the configured language
        #[arg(short, long)]
        lang: Option<Language>,
    },

    /// Answer one question and exit
    Ask {
        /// The question to answer
        question: String,

        /// Answer language (pt or en); defaults to the configured language
        #[arg(short, long)]
        lang: Option<Language>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Chat { lang } => commands::chat::run(config_path, lang).await?,
        Commands::Ask {
            question,
            lang,
            json,
        } => commands::ask::run(config_path, &question, lang, json).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
