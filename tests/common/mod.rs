//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_manifest(manifests::TWO_FILES);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
#[allow(unused_imports)]
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest YAML snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Two inline files, one nested.
    pub const TWO_FILES: &str = r#"
files:
  - path: app.js
    content: "console.log('app')"
  - path: nested/routes.js
    content: "export default []"
"#;

    /// One file copied from `source.txt` next to the manifest.
    pub const FROM_SOURCE: &str = r#"
files:
  - path: out.txt
    from: source.txt
"#;

    /// Entry with no content source.
    pub const INVALID_ENTRY: &str = r#"
files:
  - path: broken.txt
"#;
}

/// A temporary directory holding a manifest and a scratch root.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `stagehand.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("stagehand.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.path().join("stagehand.yaml")
    }

    /// Scratch root used by the tests.
    pub fn scratch_root(&self) -> PathBuf {
        self.temp_dir.path().join("scratch")
    }

    /// Names of the entries directly inside the scratch root, sorted.
    pub fn scratch_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.scratch_root())
            .expect("scratch root should exist")
            .map(|entry| {
                entry
                    .expect("readable entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
