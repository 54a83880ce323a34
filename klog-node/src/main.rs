use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use klog_node::{ConfigLoader, Handler, node};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "klog", about = "Multi-key commit log node")]
#[command(version)]
struct Cli {
    /// Config file layered over the user config
    #[arg(short, long, env = "KLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Number of store partitions (overrides config)
    #[arg(short, long)]
    partitions: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries protocol traffic, so logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(partitions) = cli.partitions {
        config.store.partitions = partitions;
    }
    ConfigLoader::validate(&config).context("Invalid configuration")?;

    info!(
        partitions = config.store.partitions,
        reply_buffer = config.node.reply_buffer,
        "Starting klog node"
    );

    let handler = Arc::new(Handler::new(config.store.open()));
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    node::run(handler, stdin, tokio::io::stdout(), config.node.reply_buffer)
        .await
        .context("Node I/O failed")
}
