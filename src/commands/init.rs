//! Init command implementation
//!
//! Claims the scratch directory for a fresh process instance: since every
//! invocation of the binary is a new process with a new token, this always
//! empties the directory and writes a new marker. The absolute path is
//! printed on stdout so scripts can capture it.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use stagehand::defaults::ROOT_ENV_VAR;
use stagehand::scratch::ScratchStore;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Scratch directory (defaults to the platform cache directory)
    #[arg(long, value_name = "PATH", env = ROOT_ENV_VAR)]
    pub root: Option<PathBuf>,
}

/// Execute the init command
pub async fn execute(args: InitArgs) -> Result<()> {
    let store = ScratchStore::open_on_disk(super::scratch_config(args.root)).await?;
    println!("{}", store.root_path().display());
    Ok(())
}
