//! kbharvest CLI: build knowledge-base JSON from topic web pages.
//!
//! Harvests configured sources into titled sections and downloads
//! reference PDFs with a manifest.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
