//! # Review Harness CLI (`rvh`)
//!
//! ## Usage
//!
//! ```bash
//! rvh --config ./config/rvh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rvh collect` | Crawl reviews into `1_opinions.json` |
//! | `rvh process` | Run the text pipeline over the collected dataset |
//! | `rvh stats` | Print the persisted frequency table |
//!
//! Without `--config`, `./config/rvh.toml` is used when present and the
//! built-in defaults otherwise.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use review_harness::{collector, config, pipeline, progress::ProgressMode};

/// Review Harness: hotel review collection and text analysis.
#[derive(Parser)]
#[command(
    name = "rvh",
    about = "Review Harness: collect hotel reviews and run them through an NLP pipeline",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Collection progress on stderr: off, human, json.
    /// Defaults to human on a terminal, off otherwise.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover entities and collect their reviews.
    ///
    /// Writes the review dataset to `<output_dir>/1_opinions.json`.
    /// Failing entities and pages are skipped and listed in the summary.
    Collect {
        /// Number of entities to collect (overrides collector.entity_limit).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Run pipeline stages over the collected dataset.
    ///
    /// Stages: corpus, tokenize, normalize, filter, analyze, vectorize.
    Process {
        /// First stage to run.
        #[arg(long)]
        from: Option<pipeline::Stage>,

        /// Last stage to run.
        #[arg(long)]
        to: Option<pipeline::Stage>,
    },

    /// Print the frequency summary from `7_frequency.json`.
    Stats,
}

fn init_logging(level: &str) -> Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => anyhow::bail!(
            "Unknown log level: '{}'. Must be trace, debug, info, warn or error.",
            other
        ),
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect { limit } => {
            let mode = ProgressMode::from_flag(cli.progress.as_deref())?;
            let reporter = mode.reporter();
            collector::run_collect(&cfg, limit, reporter.as_ref()).await?;
        }
        Commands::Process { from, to } => {
            pipeline::run_process(&cfg, from, to)?;
        }
        Commands::Stats => {
            pipeline::run_stats(&cfg)?;
        }
    }

    Ok(())
}
