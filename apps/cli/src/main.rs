//! vaultpress CLI: export a vault of linked notes as plain markdown.
//!
//! Wikilinks become site links, embedded queries are rendered in place and
//! a Lua hooks module can reshape every document on the way out.

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
