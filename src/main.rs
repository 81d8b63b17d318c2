//! pagetrack command-line entry point.

mod cli;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    pagetrack::telemetry::init();
    let cli = Cli::parse();
    cli::run(cli).await
}
