//! Courier CLI binary.
//!
//! This binary provides command-line access to the relayed API:
//! - Fetch listing pages and search results
//! - Fetch comment trees and expand truncated branches
//! - Look up category metadata

use clap::Parser;
use courier::observability::{TracingConfig, init_tracing};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, run_command};

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _tracing = init_tracing(&TracingConfig::new(level).with_json(cli.json_logs))?;

    run_command(&cli).await?;

    Ok(())
}
