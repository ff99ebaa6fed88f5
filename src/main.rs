//! markex - extract and check `//@` source markers

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = markex::cli::Cli::parse();
    markex::cli::run(cli)
}
