//! # Staging Manifest
//!
//! A manifest lists the files the `stage` command writes into a scratch
//! directory. Each entry either carries its content inline or points at a
//! source file, resolved relative to the manifest's own directory.
//!
//! ```yaml
//! files:
//!   - path: generated/routes.js
//!     content: "export default []"
//!   - path: styles/theme.css
//!     from: theme/default.css
//! ```
//!
//! Source files are re-read every time the manifest is rendered, so a
//! long-running stager picks up edits on its next pass.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One file to stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Destination, relative to the scratch root.
    pub path: String,
    /// Inline content.
    #[serde(default)]
    pub content: Option<String>,
    /// Source file, relative to the manifest directory.
    #[serde(default)]
    pub from: Option<PathBuf>,
}

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Files to stage, in order.
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
    /// Directory `from` paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// A manifest entry with its content loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: String,
    pub content: String,
}

/// Parse a manifest from a YAML string. `from` paths resolve against the
/// current directory.
pub fn parse(yaml: &str) -> Result<Manifest> {
    let manifest: Manifest = serde_yaml::from_str(yaml)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Read and parse a manifest file. `from` paths resolve against the file's
/// directory.
pub async fn from_file(path: &Path) -> Result<Manifest> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let mut manifest = parse(&yaml)?;
    manifest.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(manifest)
}

impl Manifest {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.files {
            if entry.path.trim().is_empty() {
                return Err(Error::Manifest {
                    message: "entry has an empty path".to_string(),
                    hint: None,
                });
            }
            match (&entry.content, &entry.from) {
                (Some(_), Some(_)) => {
                    return Err(Error::Manifest {
                        message: format!("entry '{}' has both content and from", entry.path),
                        hint: Some("Keep only one of 'content:' or 'from:'".to_string()),
                    });
                }
                (None, None) => {
                    return Err(Error::Manifest {
                        message: format!("entry '{}' has neither content nor from", entry.path),
                        hint: Some("Add 'content:' or 'from:' to the entry".to_string()),
                    });
                }
                _ => {}
            }
            if !seen.insert(entry.path.as_str()) {
                return Err(Error::Manifest {
                    message: format!("duplicate path '{}'", entry.path),
                    hint: None,
                });
            }
        }
        Ok(())
    }

    /// Load every entry's content.
    pub async fn render(&self) -> Result<Vec<StagedFile>> {
        let mut staged = Vec::with_capacity(self.files.len());
        for entry in &self.files {
            let content = match (&entry.content, &entry.from) {
                (Some(content), _) => content.clone(),
                (None, None) => {
                    return Err(Error::Manifest {
                        message: format!("entry '{}' has neither content nor from", entry.path),
                        hint: None,
                    });
                }
                (None, Some(from)) => {
                    let source = self.base_dir.join(from);
                    tokio::fs::read_to_string(&source)
                        .await
                        .map_err(|e| Error::Manifest {
                            message: format!(
                                "cannot read source for '{}' ({}): {}",
                                entry.path,
                                source.display(),
                                e
                            ),
                            hint: None,
                        })?
                }
            };
            staged.push(StagedFile {
                path: entry.path.clone(),
                content,
            });
        }
        Ok(staged)
    }
}
