//! Default values for stagehand configuration.

use std::path::PathBuf;

/// Environment variable overriding the scratch root for the CLI.
pub const ROOT_ENV_VAR: &str = "STAGEHAND_ROOT";

/// Returns the default scratch root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/stagehand/.temp` (XDG Base Directory)
/// - macOS: `~/Library/Caches/stagehand/.temp`
/// - Windows: `{FOLDERID_LocalAppData}\stagehand\.temp`
///
/// Falls back to `.stagehand-temp` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--root` CLI flag or the
/// `STAGEHAND_ROOT` environment variable.
pub fn default_scratch_root() -> PathBuf {
    match dirs::cache_dir() {
        Some(cache) => cache.join("stagehand").join(".temp"),
        None => PathBuf::from(".stagehand-temp"),
    }
}
