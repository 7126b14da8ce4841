//! Credit Risk Scoring Demonstrator
//!
//! Trains a default-risk classifier on a banking operations snapshot and
//! serves per-client risk reports from the persisted artifact bundle.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Credit Risk Scoring Demonstrator
#[derive(Parser)]
#[command(name = "credit-score")]
#[command(about = "Offline-trained credit default scoring with per-client risk reports")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the scoring model and publish the artifact bundle
    Train {
        /// Path to the labeled CSV snapshot
        #[arg(short, long)]
        dataset: PathBuf,

        /// Where to publish the artifact bundle
        #[arg(short, long, default_value = "artifacts/bundle.json")]
        bundle: PathBuf,
    },

    /// Score a client from the current snapshot
    Score {
        /// Path to the CSV snapshot used for lookups
        #[arg(short, long)]
        dataset: PathBuf,

        /// Path to the artifact bundle
        #[arg(short, long, default_value = "artifacts/bundle.json")]
        bundle: PathBuf,

        /// Client identifier to score
        #[arg(short, long)]
        client_id: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Train { dataset, bundle } => commands::train::run(&dataset, &bundle),
        Commands::Score {
            dataset,
            bundle,
            client_id,
        } => commands::score::run(&dataset, &bundle, client_id),
    }
}
