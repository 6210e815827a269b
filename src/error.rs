//! Error types for the conversion pipeline.
//!
//! Readers and the executor return [`ConvertError`] so that callers (and
//! tests) can match on the failure kind. Orchestration code wraps these in
//! `anyhow` with additional context.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The given path has no `_dummy` marker file.
    #[error("'{0}' is not a DokuWiki data directory (missing _dummy marker)")]
    NotADataDirectory(PathBuf),

    /// A line of the user directory does not have the expected shape.
    #[error("malformed user record at {}:{line}: {detail}", path.display())]
    MalformedUserRecord {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    /// A line of a page change log failed structural validation.
    #[error("malformed change record at {}:{line}: {detail}", path.display())]
    MalformedChangeRecord {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    /// The output directory exists and already has content.
    #[error("output directory '{0}' already exists and is not empty")]
    OutputDirectoryNotEmpty(PathBuf),

    /// A mandatory step of the operation list failed during execution.
    #[error("step {index} ({step}) failed: {detail}")]
    StepFailed {
        index: usize,
        step: String,
        detail: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
