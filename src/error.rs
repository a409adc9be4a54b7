//! Error types shared across the crate.
//!
//! Per-file failures during a move batch or an undo are never represented here;
//! they are reported in-band through `MoveResult` and `FileRestore`. Everything
//! in this module is a batch-level failure that propagates to the caller.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole operation.
#[derive(Debug, Error)]
pub enum TidyError {
    /// Classification was requested but no API key is stored or exported.
    #[error("API key not configured. Run 'tidyup set-key <KEY>' or export OPENAI_API_KEY")]
    MissingApiKey,

    /// The key passed to `set-key` does not look like an OpenAI key.
    #[error("Please enter a valid OpenAI API key (it should start with 'sk-')")]
    InvalidApiKey,

    /// The scanned folder holds nothing that could be organized.
    #[error("No files found in folder {}", .0.display())]
    NoFilesFound(PathBuf),

    /// The folder could not be enumerated at all.
    #[error("Failed to scan folder {}: {source}", path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The base folder handed to the executor does not exist.
    #[error("Invalid base folder {}: {reason}", path.display())]
    InvalidBasePath { path: PathBuf, reason: String },

    /// The remote classifier failed or replied with something unusable.
    #[error("Failed to analyze files: {0}")]
    Classifier(String),

    /// The state file exists but could not be read.
    #[error("Failed to read state file {}: {source}", path.display())]
    StateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file could not be written.
    #[error("Failed to write state file {}: {source}", path.display())]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file is not the JSON document we expect.
    #[error("Invalid state file {}: {source}", path.display())]
    StateFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading the confirmation answer from the terminal failed.
    #[error("Failed to read from terminal: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, TidyError>;
