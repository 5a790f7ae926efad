//! Brandcast CLI: research-driven, multi-channel campaign content.
//!
//! Researches a topic, plans a strategy, and writes quality-checked
//! Twitter, LinkedIn, Instagram, and newsletter content, or adapts an
//! existing long-form piece to those channels.

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
