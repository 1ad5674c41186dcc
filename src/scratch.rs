//! # Scratch Store
//!
//! A [`ScratchStore`] owns a disposable working directory (generated sources,
//! staged assets) that other tools may be watching.
//!
//! ## Ownership
//!
//! Opening a store looks for a marker file named after this process's token.
//! Without it, the directory is emptied and the marker is written: the
//! directory now belongs to this process. With it, the directory is left
//! alone, so reopening it does not pull files out from under a watcher that
//! is already tracking them. Other processes use different tokens, so a
//! second instance pointed at the same directory always starts fresh.
//!
//! ## Write Deduplication
//!
//! [`ScratchStore::write_temp`] remembers the last content written to each
//! relative path. Writing identical content again is a no-op on the
//! filesystem, which keeps modification times (and downstream rebuilds)
//! stable. The cache lives as long as the store and is never evicted.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::ScratchConfig;
use crate::error::{Error, Result};
use crate::filesystem::{DiskFs, ScratchFs};
use crate::token;

/// Counters for [`ScratchStore::write_temp`] calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    /// Calls that wrote to the filesystem
    pub writes: usize,
    /// Calls skipped because the content was unchanged
    pub skipped: usize,
}

/// A claimed scratch directory with a content-keyed write cache.
pub struct ScratchStore {
    root: PathBuf,
    marker: PathBuf,
    fs: Arc<dyn ScratchFs>,
    cache: Mutex<HashMap<PathBuf, String>>,
    writes: AtomicUsize,
    skipped: AtomicUsize,
}

impl std::fmt::Debug for ScratchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchStore")
            .field("root", &self.root)
            .field("marker", &self.marker)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ScratchStore {
    /// Open (and claim if needed) the configured directory on `fs`.
    pub async fn open(config: ScratchConfig, fs: Arc<dyn ScratchFs>) -> Result<Self> {
        let root = config.resolve_root().map_err(|e| Error::StorageInit {
            path: config.root.clone().unwrap_or_default(),
            message: e.to_string(),
        })?;
        let marker_token = match &config.marker_token {
            Some(custom) => custom.as_str(),
            None => token::process_token(),
        };
        let marker = root.join(token::marker_file_name(marker_token));

        let init_error = |e: std::io::Error| Error::StorageInit {
            path: root.clone(),
            message: e.to_string(),
        };

        if !fs.exists(&marker).await.map_err(init_error)? {
            fs.empty_dir(&root).await.map_err(init_error)?;
            fs.write_file(&marker, b"").await.map_err(init_error)?;
            debug!("Claimed scratch directory {}", root.display());
        }
        debug!("Scratch directory: {}", root.display());

        Ok(Self {
            root,
            marker,
            fs,
            cache: Mutex::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        })
    }

    /// Open the configured directory on the host filesystem.
    pub async fn open_on_disk(config: ScratchConfig) -> Result<Self> {
        Self::open(config, Arc::new(DiskFs)).await
    }

    /// Absolute path of the managed directory.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// Absolute path of this instance's marker file.
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Absolute destination for `relative_path` inside the root.
    ///
    /// Root and prefix components are dropped so the result always starts
    /// under the root; `..` is kept as-is.
    pub fn resolve(&self, relative_path: &Path) -> PathBuf {
        let mut dest = self.root.clone();
        for component in relative_path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                other => dest.push(other.as_os_str()),
            }
        }
        dest
    }

    /// Write `content` to `relative_path` under the root unless the last
    /// content written there by this store is identical. Returns the
    /// absolute destination path either way.
    pub async fn write_temp<P: AsRef<Path>>(
        &self,
        relative_path: P,
        content: &str,
    ) -> Result<PathBuf> {
        let relative = relative_path.as_ref();
        let dest = self.resolve(relative);

        // Held until the cache is updated so concurrent writes to one path
        // cannot interleave between the check and the update.
        let mut cache = self.cache.lock().await;

        if let Some(parent) = dest.parent() {
            self.fs
                .ensure_dir(parent)
                .await
                .map_err(|e| Error::StorageWrite {
                    path: dest.clone(),
                    message: format!("creating {}: {}", parent.display(), e),
                })?;
        }

        if cache.get(relative).map(String::as_str) == Some(content) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Unchanged, skipping write: {}", dest.display());
            return Ok(dest);
        }

        self.fs
            .write_file(&dest, content.as_bytes())
            .await
            .map_err(|e| Error::StorageWrite {
                path: dest.clone(),
                message: e.to_string(),
            })?;
        cache.insert(relative.to_path_buf(), content.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);

        Ok(dest)
    }

    /// Content last written to `relative_path` by this store.
    pub async fn cached_content<P: AsRef<Path>>(&self, relative_path: P) -> Option<String> {
        self.cache.lock().await.get(relative_path.as_ref()).cloned()
    }

    /// Write counters so far.
    pub fn stats(&self) -> WriteStats {
        WriteStats {
            writes: self.writes.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
