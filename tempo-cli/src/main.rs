//! Binary crate for the `tempo` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Driving a lookup session and rendering its view model

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod form;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .compact()
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
