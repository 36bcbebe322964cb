//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod scan;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "brewlens")]
#[command(about = "OCR text extraction for coffee package labels")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the OCR API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: from config)
        #[arg(long, env = "BREWLENS_BIND")]
        bind: Option<String>,
    },

    /// Run OCR on an image file and print the result as JSON
    Scan {
        /// Image file (PNG, JPEG, WebP, ...)
        file: PathBuf,
        /// Language hint, repeatable (e.g. --hint sk --hint en)
        #[arg(long = "hint")]
        hints: Vec<String>,
        /// Run the LLM correction step over the cleaned text
        #[arg(long)]
        correct: bool,
        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with(cli.config.as_deref()).await?;
    if let Some(path) = &config.source_path {
        tracing::debug!("Using config file {}", path.display());
    }

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            serve::cmd_serve(&config, &bind).await
        }
        Commands::Scan {
            file,
            hints,
            correct,
            pretty,
        } => scan::cmd_scan(&config, &file, &hints, correct, pretty).await,
    }
}
