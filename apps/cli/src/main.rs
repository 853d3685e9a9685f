//! jup2jek CLI: convert Jupyter notebooks into Jekyll posts.
//!
//! Runs nbconvert over every notebook in the site's posts directory, moves the
//! generated image folders into the site's assets directory, and points the
//! markdown image links at their new location.

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
