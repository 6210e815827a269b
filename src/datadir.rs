use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::attic::AtticIndex;
use crate::changelog::{read_change_log, PageLog};
use crate::error::ConvertError;

/// Marker file every DokuWiki data directory carries
const MARKER_FILE: &str = "_dummy";

const CHANGES_SUFFIX: &str = ".changes";

/// A validated DokuWiki `data/` directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Open a data directory, failing if the `_dummy` marker is absent
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        if !path.join(MARKER_FILE).is_file() {
            return Err(ConvertError::NotADataDirectory(path.to_path_buf()));
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-page change logs
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    /// Compressed revision snapshots
    pub fn attic_dir(&self) -> PathBuf {
        self.root.join("attic")
    }

    /// Current attachments
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    /// Default location of the user directory, next to `data/` in `conf/`
    pub fn default_users_file(&self) -> PathBuf {
        self.root.join("..").join("conf").join("users.auth.php")
    }

    /// Find every `.changes` file under `meta/`, sorted by path, paired
    /// with the page id its location encodes.
    pub fn discover_change_logs(&self) -> Result<Vec<(PathBuf, String)>, ConvertError> {
        let meta = self.meta_dir();
        let mut logs = Vec::new();

        if !meta.exists() {
            log::warn!("No meta directory at {}", meta.display());
            return Ok(logs);
        }

        for entry in WalkDir::new(&meta).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&meta).unwrap_or(path);
            if let Some(page_id) = page_id_from_meta_path(relative) {
                logs.push((path.to_path_buf(), page_id));
            }
        }

        log::debug!("Discovered {} change logs", logs.len());
        Ok(logs)
    }

    /// Read every page's change log, in discovery order
    pub fn read_page_logs(&self) -> Result<Vec<PageLog>, ConvertError> {
        let mut logs = Vec::new();
        for (path, page_id) in self.discover_change_logs()? {
            let records = read_change_log(&path, &page_id)?;
            if records.is_empty() {
                continue;
            }
            logs.push(PageLog { page_id, records });
        }
        Ok(logs)
    }

    pub fn attic_index(&self) -> Result<AtticIndex, ConvertError> {
        AtticIndex::scan(&self.attic_dir())
    }
}

/// `ns/page.changes` -> `ns:page`; `None` for anything that is not a change log
pub fn page_id_from_meta_path(relative: &Path) -> Option<String> {
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let joined = segments.join(":");
    let page_id = joined.strip_suffix(CHANGES_SUFFIX)?;
    if page_id.is_empty() || page_id.ends_with(':') {
        return None;
    }
    Some(page_id.to_string())
}
