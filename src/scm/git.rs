//! Git SCM backend using CLI commands.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{CommitRequest, Scm};
use crate::ops::Author;

/// Git SCM implementation using the git CLI.
pub struct GitScm {
    workdir: PathBuf,
}

impl GitScm {
    /// Open an existing Git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if !path.join(".git").exists() {
            return Err(anyhow!(
                "Not a git repository: '{}' (no .git directory)",
                path.display()
            ));
        }

        Ok(Self { workdir: path })
    }

    /// Initialize a new Git repository with `committer` as its local identity.
    pub fn init(path: &Path, committer: &Author) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory '{}'", path.display()))?;

        let output = Command::new("git")
            .args(["init", "--quiet"])
            .current_dir(path)
            .output()
            .context("Failed to run 'git init'")?;

        if !output.status.success() {
            return Err(anyhow!(
                "git init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let scm = Self::open(path)?;
        scm.run_git_ok(&["config", "user.name", &committer.name])?;
        scm.run_git_ok(&["config", "user.email", &committer.email])?;
        Ok(scm)
    }

    /// Run a git command and return stdout as a string.
    fn run_git(&self, args: &[&str]) -> Result<String> {
        self.run_git_with_env(args, &[])
    }

    fn run_git_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .envs(env.iter().copied())
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("Failed to run 'git {}'", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() }
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a git command, returning Ok if it succeeds (ignoring stdout).
    fn run_git_ok(&self, args: &[&str]) -> Result<()> {
        self.run_git(args)?;
        Ok(())
    }

    /// Check if a git command succeeds (exit code 0).
    fn git_succeeds(&self, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// Git's internal date format, pinned to UTC
fn git_date(date: &chrono::DateTime<chrono::Utc>) -> String {
    format!("@{} +0000", date.timestamp())
}

impl Scm for GitScm {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn stage(&self, path: &Path) -> Result<()> {
        self.run_git_ok(&["add", "--", &path.to_string_lossy()])
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.run_git_ok(&["rm", "--quiet", "--", &path.to_string_lossy()])
    }

    fn commit(&self, request: &CommitRequest<'_>) -> Result<()> {
        let author = request.author.to_string();
        let mut args = vec!["commit", "--quiet", "--author", author.as_str(), "-m", request.message];
        if request.allow_empty {
            args.push("--allow-empty");
        }

        match &request.date {
            Some(date) => {
                let date = git_date(date);
                self.run_git_with_env(
                    &args,
                    &[("GIT_AUTHOR_DATE", date.as_str()), ("GIT_COMMITTER_DATE", date.as_str())],
                )?;
            }
            None => {
                self.run_git(&args)?;
            }
        }
        Ok(())
    }

    fn has_changes(&self) -> Result<bool> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Ok(!output.is_empty())
    }

    fn commit_count(&self) -> Result<usize> {
        if !self.git_succeeds(&["rev-parse", "--verify", "--quiet", "HEAD"]) {
            return Ok(0);
        }
        let output = self.run_git(&["rev-list", "--count", "HEAD"])?;
        output
            .parse()
            .with_context(|| format!("Unexpected 'git rev-list --count' output: {output}"))
    }
}
