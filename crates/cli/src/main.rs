//! BioSentience CLI
//!
//! A command-line tool for training the models offline and for querying
//! a running analysis server: predictions, simulations, sample data,
//! and server status.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, data, simulate, train};
use std::path::PathBuf;

/// BioSentience CLI
#[derive(Parser)]
#[command(name = "bios")]
#[command(author, version, about = "CLI for the BioSentience analysis service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via BIO_API_URL env var)
    #[arg(long, env = "BIO_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the three models from a labeled CSV dataset
    Train {
        /// Path to the labeled dataset CSV
        #[arg(long, default_value = "data/biological_samples.csv")]
        dataset: PathBuf,

        /// Directory to write model artifacts into
        #[arg(long, default_value = "models")]
        out_dir: PathBuf,

        /// Number of trees per forest
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Maximum tree depth
        #[arg(long, default_value_t = 10)]
        depth: usize,

        /// Random seed for the split and the bootstrap sampling
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Analyze one sample and print predictions with explanations
    Analyze {
        /// JSON file with the 11 feature values (reads the server's
        /// sample record when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Sweep one feature and print the predicted trajectory
    Simulate {
        /// Feature to vary (wire name, e.g. gene_BRCA1)
        feature: String,

        /// Number of sweep steps
        #[arg(long, default_value_t = 10)]
        steps: usize,

        /// Symmetric variation fraction around the base value
        #[arg(long, default_value_t = 0.3)]
        range: f64,

        /// JSON file with the base feature values (reads the server's
        /// sample record when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Fetch the canonical sample record
    Sample,

    /// Show server health and model diagnostics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            dataset,
            out_dir,
            trees,
            depth,
            seed,
        } => train::run_train(&dataset, &out_dir, trees, depth, seed, cli.format),
        Commands::Analyze { input } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            analyze::run_analyze(&client, input.as_deref(), cli.format).await
        }
        Commands::Simulate {
            feature,
            steps,
            range,
            input,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            simulate::run_simulate(&client, &feature, steps, range, input.as_deref(), cli.format)
                .await
        }
        Commands::Sample => {
            let client = client::ApiClient::new(&cli.api_url)?;
            data::run_sample(&client, cli.format).await
        }
        Commands::Status => {
            let client = client::ApiClient::new(&cli.api_url)?;
            data::run_status(&client, cli.format).await
        }
    }
}
