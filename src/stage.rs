//! # Staging Passes
//!
//! Ties the two coordination pieces together: a staging pass renders a
//! manifest and writes every file through a [`ScratchStore`], and a
//! [`Serializer`] guards the pass so that a burst of triggers (file change
//! events, stdin lines) results in at most one pass running plus one queued.
//!
//! Each pass reloads the manifest from disk, so edits to it or to its source
//! files between triggers are picked up.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::manifest::{self, Manifest};
use crate::scratch::ScratchStore;
use crate::serializer::Serializer;

/// Outcome of one staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Pass number, starting at 1
    pub pass: u64,
    /// Scratch root the files were staged into
    pub root: PathBuf,
    /// Absolute destination of every staged file, in manifest order
    pub files: Vec<PathBuf>,
    /// Files whose content changed and were written
    pub written: usize,
    /// Files skipped because their content was unchanged
    pub unchanged: usize,
}

/// Stage every file of `manifest` into `store`.
///
/// Passes on one store must not overlap for `written`/`unchanged` to be
/// exact; [`stager`] guarantees that.
pub async fn stage_manifest(manifest: &Manifest, store: &ScratchStore) -> Result<StageReport> {
    let before = store.stats();

    let mut files = Vec::with_capacity(manifest.files.len());
    for staged in manifest.render().await? {
        files.push(store.write_temp(&staged.path, &staged.content).await?);
    }

    let after = store.stats();
    Ok(StageReport {
        pass: 0,
        root: store.root_path().to_path_buf(),
        files,
        written: after.writes - before.writes,
        unchanged: after.skipped - before.skipped,
    })
}

/// Build a serialized staging pass that reloads `manifest_path` each run.
pub fn stager(manifest_path: PathBuf, store: Arc<ScratchStore>) -> Serializer<StageReport> {
    let passes = Arc::new(AtomicU64::new(0));
    Serializer::new("stage", move || {
        let manifest_path = manifest_path.clone();
        let store = Arc::clone(&store);
        let passes = Arc::clone(&passes);
        async move {
            let manifest = manifest::from_file(&manifest_path).await?;
            let mut report = stage_manifest(&manifest, &store).await?;
            report.pass = passes.fetch_add(1, Ordering::SeqCst) + 1;
            info!(
                "Stage pass {}: {} written, {} unchanged",
                report.pass, report.written, report.unchanged
            );
            Ok::<_, Error>(report)
        }
    })
}
