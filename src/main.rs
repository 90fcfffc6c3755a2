//! # repo-meta CLI
//!
//! Binary entry point for the `repo-meta` command-line tool. Parses the
//! arguments with `clap`, runs the selected command and lets `anyhow` report
//! top-level errors. The work itself lives in the `repo_meta` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
