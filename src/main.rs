//! # Stagehand CLI
//!
//! This is the binary entry point for the `stagehand` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and the async runtime.
//! - Executing the appropriate command and reporting top-level errors.
//!
//! The coordination logic lives in the `stagehand` library crate; the binary
//! is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
