//! Filesystem capability used by the scratch store
//!
//! [`ScratchFs`] is the narrow set of operations a [`ScratchStore`] needs:
//! existence checks, clearing a directory, creating directories and writing
//! files. Two implementations are provided:
//!
//! - [`DiskFs`]: the host filesystem, through `tokio::fs`.
//! - [`MemoryFs`]: an in-memory tree used for dry runs and tests. It counts
//!   every file write so callers can observe write deduplication.
//!
//! [`ScratchStore`]: crate::scratch::ScratchStore

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use async_trait::async_trait;

/// Operations the scratch store performs against a filesystem.
#[async_trait]
pub trait ScratchFs: Send + Sync {
    /// Whether a file or directory exists at `path`.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Remove everything inside `path`, creating it if it does not exist.
    async fn empty_dir(&self, path: &Path) -> io::Result<()>;

    /// Create `path` and all missing ancestors. Succeeds if it already exists.
    async fn ensure_dir(&self, path: &Path) -> io::Result<()>;

    /// Write `content` to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

#[async_trait]
impl ScratchFs for DiskFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn empty_dir(&self, path: &Path) -> io::Result<()> {
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return tokio::fs::create_dir_all(path).await;
            }
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            // file_type() does not follow symlinks, so linked directories
            // are unlinked rather than traversed.
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(entry.path()).await?;
            } else {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, content).await
    }
}

/// Represents a file with content and metadata
#[derive(Debug, Clone)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// File modification time
    pub modified_time: SystemTime,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            modified_time: SystemTime::now(),
        }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, File>,
    dirs: HashSet<PathBuf>,
    writes: usize,
    read_only: bool,
}

impl MemoryState {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || !self.dirs.insert(ancestor.to_path_buf()) {
                break;
            }
        }
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if self.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only filesystem: {}", path.display()),
            ));
        }
        Ok(())
    }
}

/// In-memory filesystem keyed by full path
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

impl MemoryFs {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("memory filesystem lock poisoned"))
    }

    /// Seed a file (and its parent directories). Not counted as a write.
    pub fn add_file_string<P: AsRef<Path>>(&self, path: P, content: &str) -> io::Result<()> {
        let path = path.as_ref();
        let mut state = self.lock()?;
        if let Some(parent) = path.parent() {
            state.add_dir_all(parent);
        }
        state
            .files
            .insert(path.to_path_buf(), File::from_string(content));
        Ok(())
    }

    /// Get a copy of the file at `path`
    pub fn get_file<P: AsRef<Path>>(&self, path: P) -> Option<File> {
        self.lock().ok()?.files.get(path.as_ref()).cloned()
    }

    /// Read a file as UTF-8
    pub fn read_to_string<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.get_file(path)
            .and_then(|file| String::from_utf8(file.content).ok())
    }

    /// Check if a file exists
    pub fn contains_file<P: AsRef<Path>>(&self, path: P) -> bool {
        self.get_file(path).is_some()
    }

    /// List all files, sorted
    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match self.lock() {
            Ok(state) => state.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.lock().map(|state| state.files.len()).unwrap_or(0)
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `write_file` calls that reached the filesystem
    pub fn write_count(&self) -> usize {
        self.lock().map(|state| state.writes).unwrap_or(0)
    }

    /// Make every mutating operation fail with `PermissionDenied`
    pub fn set_read_only(&self, read_only: bool) -> io::Result<()> {
        self.lock()?.read_only = read_only;
        Ok(())
    }
}

#[async_trait]
impl ScratchFs for MemoryFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.lock()?;
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    async fn empty_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock()?;
        state.check_writable(path)?;
        state
            .files
            .retain(|file, _| !file.starts_with(path) || file == path);
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("not a directory: {}", path.display()),
            ));
        }
        state.dirs.retain(|dir| !dir.starts_with(path) || dir == path);
        state.add_dir_all(path);
        Ok(())
    }

    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock()?;
        if state.dirs.contains(path) {
            return Ok(());
        }
        state.check_writable(path)?;
        state.add_dir_all(path);
        Ok(())
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut state = self.lock()?;
        state.check_writable(path)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent directory missing: {}", parent.display()),
                ));
            }
        }
        state
            .files
            .insert(path.to_path_buf(), File::new(content.to_vec()));
        state.writes += 1;
        Ok(())
    }
}
