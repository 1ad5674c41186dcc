//! # Error Handling
//!
//! This module defines the centralized error type for `stagehand`. It uses
//! `thiserror` to derive a single `Error` enum covering every failure mode of
//! the serializer, the scratch store and the manifest loader.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures. Variants carry the path or
//!   operation name involved so messages are useful without a backtrace.
//! - **`Result<T>`**: Alias for `std::result::Result<T, Error>`.
//!
//! The three coordination failures map onto dedicated variants:
//!
//! - `Operation`: a serialized run failed or panicked. Only the awaiters of
//!   that run's handle observe it.
//! - `StorageInit`: the scratch directory could not be claimed. No store is
//!   handed out afterwards.
//! - `StorageWrite`: a scratch write failed. The write cache is untouched.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for stagehand operations
#[derive(Error, Debug)]
pub enum Error {
    /// A serialized operation failed during its run.
    #[error("Operation '{operation}' failed: {message}")]
    Operation { operation: String, message: String },

    /// The scratch directory could not be cleared or the marker file could
    /// not be written.
    #[error("Failed to initialize scratch directory {}: {message}", path.display())]
    StorageInit { path: PathBuf, message: String },

    /// Writing a file into the scratch directory failed.
    #[error("Failed to write scratch file {}: {message}", path.display())]
    StorageWrite { path: PathBuf, message: String },

    /// The staging manifest is structurally valid YAML but not usable.
    #[error("Manifest error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Manifest {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Build an `Operation` error for a named operation.
    pub fn operation(operation: &str, message: impl Into<String>) -> Self {
        Error::Operation {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
