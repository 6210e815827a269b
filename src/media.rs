use std::path::Path;
use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::ops::{Author, Operation, Step, Transform};

/// Message of the commit that snapshots the attachment tree
pub const MEDIA_COMMIT_MESSAGE: &str = "Import media files";

/// Plan a single commit containing every current attachment.
///
/// Files land at their path relative to the data root (`media/...`). The
/// commit is created even when there are no attachments.
pub fn plan_media_import(
    data_root: &Path,
    media_dir: &Path,
    author: &Author,
) -> Result<Vec<Step>, ConvertError> {
    let mut steps = Vec::new();
    let mut files = 0usize;

    if media_dir.exists() {
        for entry in WalkDir::new(media_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let src = entry.path();
            let relative = src.strip_prefix(data_root).unwrap_or(src).to_path_buf();

            if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
                steps.push(Step::required(Operation::CreateDirectory {
                    path: parent.to_path_buf(),
                }));
            }
            steps.push(Step::required(Operation::MaterializeFile {
                src: src.to_path_buf(),
                dst: relative.clone(),
                transform: Transform::Copy,
            }));
            steps.push(Step::required(Operation::StageForCommit { path: relative }));
            files += 1;
        }
    } else {
        log::info!("No media directory at {}", media_dir.display());
    }

    steps.push(Step::required(Operation::Commit {
        author: author.clone(),
        date: None,
        message: MEDIA_COMMIT_MESSAGE.to_string(),
        allow_empty: true,
    }));

    log::info!("Planned media import of {files} files");
    Ok(steps)
}
