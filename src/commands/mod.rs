//! # CLI Command Implementations
//!
//! Each subcommand of `stagehand` lives in its own file with:
//! - An `Args` struct that defines the command-specific options, derived
//!   using `clap`.
//! - An async `execute` function that takes the parsed `Args` and calls into
//!   the `stagehand` library.

use std::path::PathBuf;

use stagehand::config::ScratchConfig;

pub mod init;
pub mod stage;

/// Scratch configuration for an optional `--root` flag.
fn scratch_config(root: Option<PathBuf>) -> ScratchConfig {
    match root {
        Some(root) => ScratchConfig::new().with_root(root),
        None => ScratchConfig::new(),
    }
}
