//! SCM (Source Control Management) abstraction layer.
//!
//! The executor drives the destination repository through the [`Scm`]
//! trait; [`GitScm`] implements it with the git CLI.

mod git;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::ops::Author;

pub use git::GitScm;

/// Metadata of a commit to create
#[derive(Debug, Clone)]
pub struct CommitRequest<'a> {
    pub author: &'a Author,
    /// Author and committer date; `None` uses the current time
    pub date: Option<DateTime<Utc>>,
    pub message: &'a str,
    pub allow_empty: bool,
}

/// Trait for source control management operations.
pub trait Scm {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Stage a path (relative to the working tree).
    fn stage(&self, path: &Path) -> Result<()>;

    /// Remove a tracked path from the index and the working tree.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Commit staged changes.
    fn commit(&self, request: &CommitRequest<'_>) -> Result<()>;

    /// Check if there are uncommitted changes.
    fn has_changes(&self) -> Result<bool>;

    /// Number of commits reachable from HEAD (0 for an unborn branch).
    fn commit_count(&self) -> Result<usize>;
}

/// Initialize a new Git repository; `committer` becomes its local identity.
pub fn init(path: &Path, committer: &Author) -> Result<Box<dyn Scm>> {
    Ok(Box::new(GitScm::init(path, committer)?))
}
