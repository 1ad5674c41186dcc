//! Scratch store configuration

use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::Result;

/// How a [`ScratchStore`](crate::scratch::ScratchStore) picks its directory
/// and marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScratchConfig {
    /// Directory to manage. `None` means [`defaults::default_scratch_root`].
    pub root: Option<PathBuf>,
    /// Marker token override. `None` means the process token.
    pub marker_token: Option<String>,
}

impl ScratchConfig {
    /// Configuration with the default root and the process token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manage `root` instead of the default directory.
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Identify as a different instance than the current process.
    pub fn with_marker_token<S: Into<String>>(mut self, token: S) -> Self {
        self.marker_token = Some(token.into());
        self
    }

    /// The configured root as an absolute path. Relative roots are resolved
    /// against the current directory.
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => defaults::default_scratch_root(),
        };
        Ok(normalize(&std::path::absolute(root)?))
    }
}

/// Lexically drop `.` and fold `..` components.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
