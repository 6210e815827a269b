//! Index of archived page revisions.
//!
//! The wiki keeps one gzip-compressed snapshot per revision under
//! `attic/`, named `<page path>.<timestamp>.txt.gz`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ConvertError;

/// Suffix shared by every attic snapshot
pub const SNAPSHOT_SUFFIX: &str = ".txt.gz";

/// Attic path of the snapshot for `page_id` at `timestamp`
pub fn snapshot_path(attic_dir: &Path, page_id: &str, timestamp: i64) -> PathBuf {
    attic_dir.join(format!(
        "{}.{timestamp}{SNAPSHOT_SUFFIX}",
        page_id.replace(':', "/")
    ))
}

/// Derive `(page_id, timestamp)` from a snapshot path relative to the attic.
///
/// Page names may themselves contain dots, so the timestamp is taken from
/// the last dot-separated segment before the suffix.
pub fn parse_snapshot_path(relative: &Path) -> Option<(String, i64)> {
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let stem = segments.join("/");
    let stem = stem.strip_suffix(SNAPSHOT_SUFFIX)?;
    let (page_path, timestamp) = stem.rsplit_once('.')?;
    if page_path.is_empty() {
        return None;
    }
    let timestamp = timestamp.parse().ok()?;
    Some((page_path.replace('/', ":"), timestamp))
}

/// Every snapshot found under the attic, keyed by page and revision
#[derive(Debug, Clone, Default)]
pub struct AtticIndex {
    root: PathBuf,
    snapshots: BTreeMap<(String, i64), PathBuf>,
    unrecognized: Vec<PathBuf>,
}

impl AtticIndex {
    /// Walk `attic_dir` and index every snapshot. A missing directory is
    /// treated as an empty attic.
    pub fn scan(attic_dir: &Path) -> Result<Self, ConvertError> {
        let mut index = Self {
            root: attic_dir.to_path_buf(),
            ..Self::default()
        };

        if !attic_dir.exists() {
            log::warn!("No attic directory at {}", attic_dir.display());
            return Ok(index);
        }

        for entry in WalkDir::new(attic_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(attic_dir).unwrap_or(path);
            match parse_snapshot_path(relative) {
                Some(key) => {
                    index.snapshots.insert(key, path.to_path_buf());
                }
                None => index.unrecognized.push(path.to_path_buf()),
            }
        }

        log::debug!(
            "Indexed {} attic snapshots ({} unrecognized files)",
            index.snapshots.len(),
            index.unrecognized.len()
        );
        Ok(index)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, page_id: &str, timestamp: i64) -> bool {
        self.snapshots
            .contains_key(&(page_id.to_string(), timestamp))
    }

    pub fn get(&self, page_id: &str, timestamp: i64) -> Option<&Path> {
        self.snapshots
            .get(&(page_id.to_string(), timestamp))
            .map(PathBuf::as_path)
    }

    /// Snapshots in (page id, timestamp) order
    pub fn snapshots(&self) -> impl Iterator<Item = (&str, i64, &Path)> {
        self.snapshots
            .iter()
            .map(|((page, ts), path)| (page.as_str(), *ts, path.as_path()))
    }

    /// Files under the attic whose name is not a snapshot name
    pub fn unrecognized(&self) -> &[PathBuf] {
        &self.unrecognized
    }

}
