//! End-to-end conversion: plan the step list from a data directory, then
//! replay it into a fresh repository.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::changelog::{reconcile, ChangeRecord};
use crate::config::Settings;
use crate::datadir::DataDir;
use crate::error::ConvertError;
use crate::executor::{ExecutionSummary, Executor};
use crate::logger;
use crate::materialize::{ContentMaterializer, ShellMaterializer};
use crate::media::plan_media_import;
use crate::ops::{Operation, Step};
use crate::replay::HistoryReplayer;
use crate::scm::{self, Scm};
use crate::users::UserDirectory;
use crate::VerbosityLevel;

/// Message of the empty commit that closes every conversion
pub const MARKER_COMMIT_MESSAGE: &str = "Converted from DokuWiki";

/// What planning found in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    /// Pages with at least one change record
    pub pages: usize,
    /// Changelog entries that will become commits
    pub revisions: usize,
    /// Entries dropped because their attic snapshot is missing
    pub missing_snapshots: usize,
    /// Attic files no entry refers to
    pub orphan_snapshots: usize,
}

/// The ordered step list for one conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionPlan {
    pub stats: PlanStats,
    /// Changelog entries dropped for lack of an attic snapshot
    pub skipped: Vec<ChangeRecord>,
    pub steps: Vec<Step>,
}

/// Build the full step list for the data directory at `data_path`.
///
/// Reads input only; the output directory is not touched.
pub fn plan(data_path: &Path, settings: &Settings) -> Result<ConversionPlan> {
    let data_dir = DataDir::open(data_path)?;

    let users_file = settings
        .users_file
        .clone()
        .unwrap_or_else(|| data_dir.default_users_file());
    let users = UserDirectory::load_optional(&users_file)
        .with_context(|| format!("Failed to load user directory {}", users_file.display()))?;

    let logs = data_dir.read_page_logs()?;
    let pages = logs.len();
    let attic = data_dir.attic_index()?;
    let reconciled = reconcile(logs, &attic);

    let replayer = HistoryReplayer::new(&users, settings, &attic);
    let mut steps = replayer.replay(&reconciled.changelog);

    steps.extend(plan_media_import(
        data_dir.root(),
        &data_dir.media_dir(),
        &settings.identity,
    )?);

    steps.push(Step::required(Operation::Commit {
        author: settings.identity.clone(),
        date: None,
        message: MARKER_COMMIT_MESSAGE.to_string(),
        allow_empty: true,
    }));

    if settings.gc {
        steps.push(Step::best_effort(Operation::RawShellStep {
            argv: vec!["git".to_string(), "gc".to_string(), "--quiet".to_string()],
            redirect: None,
        }));
    }

    Ok(ConversionPlan {
        stats: PlanStats {
            pages,
            revisions: reconciled.changelog.len(),
            missing_snapshots: reconciled.missing.len(),
            orphan_snapshots: reconciled.orphans.len(),
        },
        skipped: reconciled.missing,
        steps,
    })
}

/// Refuse to convert into a directory that already has content
fn ensure_fresh_output(output_dir: &Path) -> Result<(), ConvertError> {
    if output_dir.exists() && fs::read_dir(output_dir)?.next().is_some() {
        return Err(ConvertError::OutputDirectoryNotEmpty(output_dir.to_path_buf()));
    }
    Ok(())
}

/// Initialize a repository at `output_dir` and execute the plan in it
pub fn execute(
    plan: &ConversionPlan,
    output_dir: &Path,
    settings: &Settings,
    materializer: &dyn ContentMaterializer,
) -> Result<ExecutionSummary> {
    ensure_fresh_output(output_dir)?;

    let repo = scm::init(output_dir, &settings.identity)
        .with_context(|| format!("Failed to initialize repository at {}", output_dir.display()))?;
    log::info!("Initialized repository at {}", output_dir.display());

    let summary = Executor::new(&*repo, materializer).execute(&plan.steps)?;
    verify_history(&*repo, &summary)?;
    Ok(summary)
}

/// Cross-check the finished repository against the executor's counts.
///
/// Returns `false` (after logging a warning) when they disagree.
fn verify_history(repo: &dyn Scm, summary: &ExecutionSummary) -> Result<bool> {
    let mut consistent = true;

    let recorded = repo.commit_count()?;
    if recorded != summary.commits {
        log::warn!(
            "Repository has {recorded} commits but {} were reported as created",
            summary.commits
        );
        consistent = false;
    }

    if repo.has_changes()? {
        log::warn!(
            "Working tree of {} has uncommitted changes after conversion",
            repo.workdir().display()
        );
        consistent = false;
    }

    Ok(consistent)
}

/// Convert the data directory at `data_path` as configured by `settings`.
///
/// With `dry_run` the plan is printed as JSON instead of executed.
pub fn run(
    data_path: &Path,
    settings: &Settings,
    dry_run: bool,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let plan = plan(data_path, settings)?;

    if dry_run {
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    let summary = execute(&plan, &settings.output_dir, settings, &ShellMaterializer::default())?;

    let line = format!(
        "Converted {} into {}: {} pages, {} commits ({} revisions skipped, {} failures tolerated)",
        data_path.display(),
        settings.output_dir.display(),
        plan.stats.pages,
        summary.commits,
        plan.stats.missing_snapshots,
        summary.tolerated
    );
    if let Err(e) = logger::log_to_file(&line) {
        log::debug!("Could not write log file: {e:#}");
    }

    if verbosity != VerbosityLevel::Quiet {
        println!("{}", "=== Conversion Complete ===".green().bold());
        println!("  {} {}", "Repository:".bold(), settings.output_dir.display());
        println!("  {} {}", "Pages:".bold(), plan.stats.pages);
        println!("  {} {}", "Commits:".bold(), summary.commits);
        if plan.stats.missing_snapshots > 0 {
            println!(
                "  {} {} revisions had no attic snapshot",
                "!".yellow().bold(),
                plan.stats.missing_snapshots
            );
        }
        if plan.stats.orphan_snapshots > 0 {
            println!(
                "  {} {} attic snapshots had no changelog entry",
                "!".yellow().bold(),
                plan.stats.orphan_snapshots
            );
        }
    }

    Ok(())
}
