//! bkindex - persistent BK-tree from the command line

use anyhow::Context;
use bkindex_cli::{insert, open_tree, query, CliConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bkindex")]
#[command(about = "Approximate-match index over a persistent BK-tree")]
#[command(version)]
struct Args {
    /// Value store directory (overrides config)
    #[arg(long)]
    values: Option<PathBuf>,

    /// Index store directory (overrides config)
    #[arg(long)]
    index: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "BKINDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "BKINDEX_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert a key, or overwrite its value
    Insert { key: String, value: String },

    /// Print values of keys near a query key, one per line
    Query {
        key: String,

        /// Pruning threshold
        #[arg(short, long, default_value_t = 2)]
        threshold: u32,

        /// Maximum number of values
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Acceptance radius, defaults to the threshold
        #[arg(short, long)]
        radius: Option<u32>,
    },

    /// Forget the root so the next insert starts a new tree
    Reset,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("bkindex_cli={log_level},bkindex_core={log_level},bkindex_store={log_level}")
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = CliConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(values) = args.values {
        config.values_dir = values;
    }
    if let Some(index) = args.index {
        config.index_dir = index;
    }
    tracing::debug!(?config, "configuration loaded");

    let mut tree = open_tree(&config)?;

    match args.command {
        Command::Insert { key, value } => insert(&mut tree, &key, &value)?,
        Command::Query {
            key,
            threshold,
            limit,
            radius,
        } => {
            for value in query(&tree, &key, threshold, limit, radius)? {
                println!("{value}");
            }
        }
        Command::Reset => tree.reset()?,
    }

    Ok(())
}
