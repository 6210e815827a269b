//! Content materialization: decompressing attic snapshots and running the
//! external format converter.
//!
//! The executor only sees the [`ContentMaterializer`] trait, so tests can
//! substitute an in-process implementation.

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Produces page content from archived snapshots
pub trait ContentMaterializer {
    /// Decompressed bytes of a gzip snapshot
    fn decompress(&self, src: &Path) -> Result<Vec<u8>>;

    /// `content` (DokuWiki markup) converted to `format`
    fn convert(&self, content: &[u8], format: &str) -> Result<Vec<u8>>;
}

/// Shells out to `gzip` and `pandoc`
#[derive(Debug, Clone)]
pub struct ShellMaterializer {
    gzip: String,
    pandoc: String,
}

impl Default for ShellMaterializer {
    fn default() -> Self {
        Self {
            gzip: "gzip".to_string(),
            pandoc: "pandoc".to_string(),
        }
    }
}

impl ContentMaterializer for ShellMaterializer {
    fn decompress(&self, src: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.gzip)
            .arg("-dc")
            .arg(src)
            .output()
            .with_context(|| format!("Failed to run '{} -dc {}'", self.gzip, src.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} -dc {} failed: {}",
                self.gzip,
                src.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(output.stdout)
    }

    fn convert(&self, content: &[u8], format: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.pandoc)
            .args(["-f", "dokuwiki", "-t", format])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run '{}'", self.pandoc))?;

        // Written from its own thread: pandoc may fill stdout before reading all input.
        let mut stdin = child.stdin.take().context("Failed to open converter stdin")?;
        let input = content.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .context("Failed to wait for converter")?;
        writer
            .join()
            .map_err(|_| anyhow!("Converter input thread panicked"))?
            .context("Failed to write page to converter")?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} -t {format} failed: {}",
                self.pandoc,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(output.stdout)
    }
}
