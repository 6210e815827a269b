//! Shared fixtures for integration tests.

#![allow(dead_code)]

use anyhow::Result;
use dokuwiki2git::config::Settings;
use dokuwiki2git::materialize::ContentMaterializer;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A scratch DokuWiki install: `<root>/data` and `<root>/conf`
pub struct WikiFixture {
    pub temp: TempDir,
}

impl WikiFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("data")).unwrap();
        fs::create_dir_all(temp.path().join("conf")).unwrap();
        fs::write(temp.path().join("data/_dummy"), "").unwrap();
        Self { temp }
    }

    pub fn data(&self) -> PathBuf {
        self.temp.path().join("data")
    }

    pub fn output(&self) -> PathBuf {
        self.temp.path().join("gitdir")
    }

    /// Settings writing into this fixture's output directory
    pub fn settings(&self) -> Settings {
        Settings {
            output_dir: self.output(),
            ..Settings::default()
        }
    }

    /// Append a line to the change log of `page_id`
    pub fn change(&self, page_id: &str, line: &str) -> &Self {
        let path = self
            .data()
            .join("meta")
            .join(format!("{}.changes", page_id.replace(':', "/")));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut content = fs::read_to_string(&path).unwrap_or_default();
        content.push_str(line);
        content.push('\n');
        fs::write(path, content).unwrap();
        self
    }

    /// Write an attic snapshot. Content is stored uncompressed; tests read
    /// it back through [`PlainMaterializer`].
    pub fn snapshot(&self, page_id: &str, timestamp: i64, content: &str) -> &Self {
        let path = self.data().join("attic").join(format!(
            "{}.{timestamp}.txt.gz",
            page_id.replace(':', "/")
        ));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn users(&self, content: &str) -> &Self {
        fs::write(self.temp.path().join("conf/users.auth.php"), content).unwrap();
        self
    }

    pub fn media(&self, relative: &str, bytes: &[u8]) -> &Self {
        let path = self.data().join("media").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
        self
    }
}

/// Reads snapshots as plain text
pub struct PlainMaterializer;

impl ContentMaterializer for PlainMaterializer {
    fn decompress(&self, src: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(src)?)
    }

    fn convert(&self, _content: &[u8], format: &str) -> Result<Vec<u8>> {
        anyhow::bail!("no converter for {format} in tests")
    }
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `repo` and return trimmed stdout
pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
