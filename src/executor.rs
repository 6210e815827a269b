//! Sequential replay of a planned step list against a repository working tree.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ConvertError;
use crate::materialize::ContentMaterializer;
use crate::ops::{Operation, Step, Transform};
use crate::scm::{CommitRequest, Scm};

/// Counts gathered while executing a step list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Steps that completed successfully
    pub executed: usize,
    /// Best-effort steps that failed and were skipped
    pub tolerated: usize,
    /// Commits actually created
    pub commits: usize,
}

/// Performs steps one at a time, in order, in the repository working tree
pub struct Executor<'a> {
    scm: &'a dyn Scm,
    materializer: &'a dyn ContentMaterializer,
}

impl<'a> Executor<'a> {
    pub fn new(scm: &'a dyn Scm, materializer: &'a dyn ContentMaterializer) -> Self {
        Self { scm, materializer }
    }

    /// Execute every step. The first failing required step aborts with
    /// [`ConvertError::StepFailed`]; failing best-effort steps are counted.
    pub fn execute(&self, steps: &[Step]) -> Result<ExecutionSummary, ConvertError> {
        let mut summary = ExecutionSummary::default();

        for (index, step) in steps.iter().enumerate() {
            log::debug!("[{}/{}] {}", index + 1, steps.len(), step.operation);

            match self.apply(&step.operation) {
                Ok(()) => {
                    summary.executed += 1;
                    if step.operation.is_commit() {
                        summary.commits += 1;
                    }
                }
                Err(e) if step.best_effort => {
                    summary.tolerated += 1;
                    log::log!(
                        tolerated_level(&step.operation),
                        "Skipped {}: {:#}",
                        step.operation,
                        e
                    );
                }
                Err(e) => {
                    return Err(ConvertError::StepFailed {
                        index,
                        step: step.operation.to_string(),
                        detail: format!("{e:#}"),
                    });
                }
            }
        }

        log::info!(
            "Executed {} steps, {} commits, {} tolerated failures",
            summary.executed,
            summary.commits,
            summary.tolerated
        );
        Ok(summary)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.scm.workdir().join(path)
    }

    fn apply(&self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::CreateDirectory { path } => {
                let dir = self.resolve(path);
                fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory {}", dir.display()))
            }
            Operation::MaterializeFile {
                src,
                dst,
                transform,
            } => self.materialize(src, &self.resolve(dst), transform),
            Operation::RemoveFile { path } => self.scm.remove(path),
            Operation::StageForCommit { path } => self.scm.stage(path),
            Operation::Commit {
                author,
                date,
                message,
                allow_empty,
            } => self.scm.commit(&CommitRequest {
                author,
                date: *date,
                message,
                allow_empty: *allow_empty,
            }),
            Operation::RawShellStep { argv, redirect } => self.run_raw(argv, redirect.as_deref()),
        }
    }

    fn materialize(&self, src: &Path, dst: &Path, transform: &Transform) -> Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        match transform {
            Transform::Decompress => {
                let content = self.materializer.decompress(src)?;
                fs::write(dst, content)
                    .with_context(|| format!("Failed to write {}", dst.display()))
            }
            Transform::Copy => {
                fs::copy(src, dst).with_context(|| {
                    format!("Failed to copy {} to {}", src.display(), dst.display())
                })?;
                Ok(())
            }
            Transform::Convert { format } => {
                let content = fs::read(dst)
                    .with_context(|| format!("Failed to read {}", dst.display()))?;
                let converted = self.materializer.convert(&content, format)?;
                fs::write(dst, converted)
                    .with_context(|| format!("Failed to write {}", dst.display()))
            }
        }
    }

    fn run_raw(&self, argv: &[String], redirect: Option<&Path>) -> Result<()> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("Empty command line"))?;

        let mut command = Command::new(program);
        command.args(args).current_dir(self.scm.workdir());

        if let Some(redirect) = redirect {
            let target = self.resolve(redirect);
            let file = File::create(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            command.stdout(Stdio::from(file));
        } else {
            command.stdout(Stdio::null());
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run '{}'", argv.join(" ")))?;

        if !output.status.success() {
            return Err(anyhow!(
                "'{}' failed: {}",
                argv.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(())
    }
}

/// Level a tolerated failure is reported at
fn tolerated_level(operation: &Operation) -> log::Level {
    match operation {
        Operation::Commit { .. } | Operation::RemoveFile { .. } => log::Level::Info,
        _ => log::Level::Warn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Author;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records calls instead of touching a real repository
    struct RecordingScm {
        workdir: PathBuf,
        calls: RefCell<Vec<String>>,
        fail_stage: bool,
    }

    impl RecordingScm {
        fn new(workdir: &Path) -> Self {
            Self {
                workdir: workdir.to_path_buf(),
                calls: RefCell::new(Vec::new()),
                fail_stage: false,
            }
        }
    }

    impl Scm for RecordingScm {
        fn workdir(&self) -> &Path {
            &self.workdir
        }

        fn stage(&self, path: &Path) -> Result<()> {
            self.calls.borrow_mut().push(format!("add {}", path.display()));
            if self.fail_stage {
                return Err(anyhow!("index locked"));
            }
            Ok(())
        }

        fn remove(&self, path: &Path) -> Result<()> {
            self.calls.borrow_mut().push(format!("rm {}", path.display()));
            if self.workdir.join(path).exists() {
                Ok(())
            } else {
                Err(anyhow!("pathspec did not match any files"))
            }
        }

        fn commit(&self, request: &CommitRequest<'_>) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("commit {}", request.message));
            Ok(())
        }

        fn has_changes(&self) -> Result<bool> {
            Ok(false)
        }

        fn commit_count(&self) -> Result<usize> {
            Ok(self
                .calls
                .borrow()
                .iter()
                .filter(|c| c.starts_with("commit"))
                .count())
        }
    }

    /// Treats snapshot files as plain text and upper-cases on conversion
    struct PlainMaterializer;

    impl ContentMaterializer for PlainMaterializer {
        fn decompress(&self, src: &Path) -> Result<Vec<u8>> {
            Ok(fs::read(src)?)
        }

        fn convert(&self, content: &[u8], format: &str) -> Result<Vec<u8>> {
            if format == "broken" {
                return Err(anyhow!("unknown format"));
            }
            Ok(content.to_ascii_uppercase())
        }
    }

    fn commit(message: &str) -> Step {
        Step::best_effort(Operation::Commit {
            author: Author::new("Alice A", "alice@x.com"),
            date: None,
            message: message.to_string(),
            allow_empty: false,
        })
    }

    #[test]
    fn test_materialize_and_convert() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let snapshot = data.path().join("page.1000.txt.gz");
        fs::write(&snapshot, "hello").unwrap();

        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![
            Step::required(Operation::CreateDirectory {
                path: PathBuf::from("ns"),
            }),
            Step::required(Operation::MaterializeFile {
                src: snapshot,
                dst: PathBuf::from("ns/page.txt"),
                transform: Transform::Decompress,
            }),
            Step::best_effort(Operation::MaterializeFile {
                src: PathBuf::from("ns/page.txt"),
                dst: PathBuf::from("ns/page.txt"),
                transform: Transform::Convert {
                    format: "markdown".to_string(),
                },
            }),
            Step::required(Operation::StageForCommit {
                path: PathBuf::from("ns/page.txt"),
            }),
            commit("ns:page: created"),
        ];

        let summary = executor.execute(&steps).unwrap();
        assert_eq!(summary.executed, 5);
        assert_eq!(summary.commits, 1);
        assert_eq!(summary.tolerated, 0);
        assert_eq!(
            fs::read_to_string(work.path().join("ns/page.txt")).unwrap(),
            "HELLO"
        );
        assert_eq!(
            *scm.calls.borrow(),
            vec!["add ns/page.txt".to_string(), "commit ns:page: created".to_string()]
        );
    }

    #[test]
    fn test_failed_conversion_keeps_raw_content() {
        let work = TempDir::new().unwrap();
        fs::write(work.path().join("page.txt"), "raw").unwrap();

        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![Step::best_effort(Operation::MaterializeFile {
            src: PathBuf::from("page.txt"),
            dst: PathBuf::from("page.txt"),
            transform: Transform::Convert {
                format: "broken".to_string(),
            },
        })];

        let summary = executor.execute(&steps).unwrap();
        assert_eq!(summary.tolerated, 1);
        assert_eq!(fs::read_to_string(work.path().join("page.txt")).unwrap(), "raw");
    }

    #[test]
    fn test_best_effort_remove_of_absent_file() {
        let work = TempDir::new().unwrap();
        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![
            Step::best_effort(Operation::RemoveFile {
                path: PathBuf::from("ns/never-created.txt"),
            }),
            commit("ns:never-created: spam"),
        ];

        let summary = executor.execute(&steps).unwrap();
        assert_eq!(summary.tolerated, 1);
        assert_eq!(summary.executed, 1);
    }

    #[test]
    fn test_tolerated_failures_are_visible_by_default() {
        let remove = Operation::RemoveFile {
            path: PathBuf::from("ns/never-created.txt"),
        };
        let convert = Operation::MaterializeFile {
            src: PathBuf::from("page.txt"),
            dst: PathBuf::from("page.txt"),
            transform: Transform::Convert {
                format: "markdown".to_string(),
            },
        };
        let shell = Operation::RawShellStep {
            argv: vec!["git".to_string(), "gc".to_string()],
            redirect: None,
        };

        assert_eq!(tolerated_level(&commit("ns:page: same").operation), log::Level::Info);
        assert_eq!(tolerated_level(&remove), log::Level::Info);
        assert_eq!(tolerated_level(&convert), log::Level::Warn);
        assert_eq!(tolerated_level(&shell), log::Level::Warn);

        // Info is shown at the default verbosity
        assert!(log::Level::Info <= crate::VerbosityLevel::Normal.level_filter());
    }

    #[test]
    fn test_required_failure_aborts() {
        let work = TempDir::new().unwrap();
        let mut scm = RecordingScm::new(work.path());
        scm.fail_stage = true;
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![
            Step::required(Operation::StageForCommit {
                path: PathBuf::from("page.txt"),
            }),
            commit("never reached"),
        ];

        let err = executor.execute(&steps).unwrap_err();
        match err {
            ConvertError::StepFailed { index, step, detail } => {
                assert_eq!(index, 0);
                assert_eq!(step, "stage page.txt");
                assert!(detail.contains("index locked"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(scm.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_snapshot_is_fatal() {
        let work = TempDir::new().unwrap();
        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![Step::required(Operation::MaterializeFile {
            src: PathBuf::from("/nonexistent/page.1.txt.gz"),
            dst: PathBuf::from("page.txt"),
            transform: Transform::Decompress,
        })];

        assert!(matches!(
            executor.execute(&steps),
            Err(ConvertError::StepFailed { index: 0, .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_raw_shell_step_redirect() {
        let work = TempDir::new().unwrap();
        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![Step::required(Operation::RawShellStep {
            argv: vec!["echo".to_string(), "converted".to_string()],
            redirect: Some(PathBuf::from("out.log")),
        })];

        executor.execute(&steps).unwrap();
        assert_eq!(
            fs::read_to_string(work.path().join("out.log")).unwrap(),
            "converted\n"
        );
    }

    #[test]
    fn test_raw_shell_step_failure_tolerated() {
        let work = TempDir::new().unwrap();
        let scm = RecordingScm::new(work.path());
        let executor = Executor::new(&scm, &PlainMaterializer);
        let steps = vec![Step::best_effort(Operation::RawShellStep {
            argv: vec!["definitely-not-a-command".to_string()],
            redirect: None,
        })];

        let summary = executor.execute(&steps).unwrap();
        assert_eq!(summary.tolerated, 1);
    }
}
