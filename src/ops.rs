//! Repository mutation steps produced by planning and consumed by the executor.
//!
//! The list is positional: each commit covers whatever was staged since the
//! previous one, so steps are never reordered or batched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Commit author identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// How a file is produced in the working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Decompress an attic snapshot
    Decompress,
    /// Copy verbatim
    Copy,
    /// Rewrite the destination in place with the external converter
    Convert { format: String },
}

/// A single repository mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateDirectory {
        path: PathBuf,
    },
    MaterializeFile {
        src: PathBuf,
        dst: PathBuf,
        transform: Transform,
    },
    RemoveFile {
        path: PathBuf,
    },
    StageForCommit {
        path: PathBuf,
    },
    Commit {
        author: Author,
        /// `None` commits with the time of execution
        date: Option<DateTime<Utc>>,
        message: String,
        allow_empty: bool,
    },
    RawShellStep {
        argv: Vec<String>,
        redirect: Option<PathBuf>,
    },
}

impl Operation {
    pub fn is_commit(&self) -> bool {
        matches!(self, Operation::Commit { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateDirectory { path } => write!(f, "mkdir {}", path.display()),
            Operation::MaterializeFile {
                src,
                dst,
                transform,
            } => match transform {
                Transform::Decompress => {
                    write!(f, "decompress {} -> {}", src.display(), dst.display())
                }
                Transform::Copy => write!(f, "copy {} -> {}", src.display(), dst.display()),
                Transform::Convert { format } => {
                    write!(f, "convert {} to {format}", dst.display())
                }
            },
            Operation::RemoveFile { path } => write!(f, "remove {}", path.display()),
            Operation::StageForCommit { path } => write!(f, "stage {}", path.display()),
            Operation::Commit {
                author, message, ..
            } => write!(f, "commit by {author}: {message}"),
            Operation::RawShellStep { argv, redirect } => {
                write!(f, "run {}", argv.join(" "))?;
                if let Some(redirect) = redirect {
                    write!(f, " > {}", redirect.display())?;
                }
                Ok(())
            }
        }
    }
}

/// An operation plus whether its failure may be ignored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    #[serde(flatten)]
    pub operation: Operation,
    pub best_effort: bool,
}

impl Step {
    /// A step whose failure aborts the run
    pub fn required(operation: Operation) -> Self {
        Self {
            operation,
            best_effort: false,
        }
    }

    /// A step whose failure is logged and skipped
    pub fn best_effort(operation: Operation) -> Self {
        Self {
            operation,
            best_effort: true,
        }
    }
}
