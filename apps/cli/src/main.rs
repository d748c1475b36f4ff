//! wikisift CLI: search the wiki's link collection from the terminal.
//!
//! Downloads the wiki pages, flattens them into annotated lines, and
//! filters those lines against a query.

mod commands;
mod render;

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
