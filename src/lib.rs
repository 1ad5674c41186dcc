//! # Stagehand Library
//!
//! Coordination primitives for tools that regenerate files into a working
//! directory while other tools watch it:
//!
//! - **Serializer (`serializer`)**: wraps a zero-argument async operation so
//!   that at most one run is in flight and any number of requests made
//!   during a run collapse into a single trailing run.
//! - **Scratch store (`scratch`)**: claims a directory for this process
//!   (emptying it only the first time) and skips writes whose content has
//!   not changed since the last write.
//!
//! The two are independent. `stage` combines them into the staging passes
//! behind the `stagehand` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use stagehand::config::ScratchConfig;
//! use stagehand::filesystem::MemoryFs;
//! use stagehand::scratch::ScratchStore;
//!
//! # #[tokio::main]
//! # async fn main() -> stagehand::error::Result<()> {
//! let fs = Arc::new(MemoryFs::new());
//! let store = ScratchStore::open(ScratchConfig::new().with_root("/work/.temp"), fs.clone()).await?;
//!
//! let path = store.write_temp("x/y.txt", "hi").await?;
//! assert_eq!(store.write_temp("x/y.txt", "hi").await?, path);
//!
//! // The marker plus one file; the second call never touched the filesystem.
//! assert_eq!(fs.len(), 2);
//! assert_eq!(store.stats().skipped, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `config` / `defaults`: where the scratch directory lives.
//! - `filesystem`: the `ScratchFs` capability with disk and in-memory
//!   implementations.
//! - `token`: the per-process random token naming the ownership marker.
//! - `manifest`: the YAML file list consumed by `stage`.
//! - `error`: the crate-wide `Error` and `Result`.

pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod manifest;
pub mod scratch;
pub mod serializer;
pub mod stage;
pub mod token;

#[cfg(test)]
mod scratch_proptest;
