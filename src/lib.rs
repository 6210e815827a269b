//! # dokuwiki2git
//!
//! Converts a DokuWiki data directory into a git repository whose history
//! mirrors the wiki's page edit history.
//!
//! ## Overview
//!
//! DokuWiki stores every page edit as a line in `meta/<page>.changes` and
//! keeps a gzip snapshot per revision in `attic/`. `dokuwiki2git` merges all
//! change logs into one chronological list, checks it against the attic,
//! and replays it as one commit per edit with the original author, date,
//! and edit summary. Current media files follow as one extra commit.
//!
//! ## Architecture
//!
//! Conversion is split into a pure planning phase and an execution phase:
//!
//! - Input readers ([`datadir`], [`users`], [`changelog`], [`attic`])
//! - Planning ([`replay`], [`media`], [`convert::plan`]) producing a list of [`ops::Step`]s
//! - Execution ([`executor`], [`scm`], [`materialize`]) replaying that list into a repository
//! - Ambient concerns ([`config`], [`logger`], [`error`])

/// Index of archived page revisions in `attic/`.
pub mod attic;

/// Per-page change log parsing and reconciliation into one global changelog.
pub mod changelog;

/// Configuration directory management and conversion settings.
///
/// Settings are read from a TOML file in the platform config directory (or
/// a file given on the command line) and overridden by CLI flags.
pub mod config;

/// Planning and running a whole conversion.
pub mod convert;

/// Layout of a DokuWiki data directory.
pub mod datadir;

/// Error types shared by the readers and the executor.
pub mod error;

/// Sequential execution of a planned step list.
pub mod executor;

/// Logging configuration and utilities.
///
/// Sets up console logging (level from the CLI or `RUST_LOG`) plus a
/// persistent log file in the config directory, rotated when it grows
/// past 10 MB.
pub mod logger;

/// Decompression and format conversion of page content.
pub mod materialize;

/// Snapshot of the current attachment tree as a single commit.
pub mod media;

/// Repository mutation steps.
pub mod ops;

/// One commit per changelog entry.
pub mod replay;

/// Destination repository backend.
pub mod scm;

/// The wiki's user directory (`users.auth.php`).
pub mod users;

use log::LevelFilter;

/// Console verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerbosityLevel {
    /// Warnings and errors only
    Quiet,
    /// Progress information
    #[default]
    Normal,
    /// Every planned and executed step
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::Warn,
            VerbosityLevel::Normal => LevelFilter::Info,
            VerbosityLevel::Verbose => LevelFilter::Debug,
        }
    }
}
