//! contentkit CLI — content tree assembly and collection schema extraction.
//!
//! Reads content node lists and collection modules from disk and prints the
//! assembled trees, path indexes, schemas, and category nodes as JSON.

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
