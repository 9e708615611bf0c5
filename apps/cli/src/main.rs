//! specsync command line interface.
//!
//! Builds a documentation site content tree from upstream specification
//! repositories and keeps the written tree clean afterwards.

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
