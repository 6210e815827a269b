use std::collections::HashSet;
use std::path::PathBuf;

use super::record::{ChangeRecord, PageLog};
use crate::attic::{snapshot_path, AtticIndex};

/// All change records of the wiki, oldest first
pub type GlobalChangelog = Vec<ChangeRecord>;

/// Result of merging the page logs and checking them against the attic
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Records that survive validation, sorted by timestamp (stable)
    pub changelog: GlobalChangelog,

    /// Content-bearing records dropped because their snapshot is absent
    pub missing: Vec<ChangeRecord>,

    /// Attic files no surviving record refers to
    pub orphans: Vec<PathBuf>,
}

/// Merge every page log into one chronological changelog.
///
/// Records whose revision is not in the attic are dropped; attic snapshots
/// that no record refers to are reported. Both checks only warn.
pub fn reconcile(logs: Vec<PageLog>, attic: &AtticIndex) -> Reconciled {
    let mut all: Vec<ChangeRecord> = logs.into_iter().flat_map(|log| log.records).collect();
    // sort_by_key is stable: equal timestamps keep discovery order
    all.sort_by_key(|record| record.timestamp);

    let mut changelog = Vec::with_capacity(all.len());
    let mut missing = Vec::new();

    for record in all {
        if record.change_type.is_content_bearing()
            && !attic.contains(&record.page_id, record.timestamp)
        {
            log::warn!(
                "Missing attic snapshot for {} at {} (expected {}), revision skipped",
                record.page_id,
                record.timestamp,
                snapshot_path(attic.root(), &record.page_id, record.timestamp).display()
            );
            missing.push(record);
            continue;
        }
        changelog.push(record);
    }

    let referenced: HashSet<(&str, i64)> = changelog
        .iter()
        .map(|record| (record.page_id.as_str(), record.timestamp))
        .collect();

    let mut orphans = Vec::new();
    for (page_id, timestamp, path) in attic.snapshots() {
        if !referenced.contains(&(page_id, timestamp)) {
            log::warn!(
                "Attic snapshot {} ({} at {}) has no changelog entry, not imported",
                path.display(),
                page_id,
                timestamp
            );
            orphans.push(path.to_path_buf());
        }
    }
    for path in attic.unrecognized() {
        log::warn!("Unrecognized file in attic: {}", path.display());
        orphans.push(path.clone());
    }

    log::info!(
        "Reconciled changelog: {} entries, {} missing snapshots, {} orphan snapshots",
        changelog.len(),
        missing.len(),
        orphans.len()
    );

    Reconciled {
        changelog,
        missing,
        orphans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::ChangeType;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn record(page_id: &str, timestamp: i64, change_type: ChangeType, comment: &str) -> ChangeRecord {
        ChangeRecord {
            timestamp,
            author_ip: "10.0.0.1".to_string(),
            change_type,
            page_id: page_id.to_string(),
            author_login: "alice".to_string(),
            comment: comment.to_string(),
        }
    }

    fn attic_with(snapshots: &[&str]) -> (TempDir, AtticIndex) {
        let temp = TempDir::new().unwrap();
        let attic = temp.path().join("attic");
        fs::create_dir_all(&attic).unwrap();
        for name in snapshots {
            let path = attic.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"snapshot").unwrap();
        }
        let index = AtticIndex::scan(&attic).unwrap();
        (temp, index)
    }

    #[test]
    fn test_sorted_across_pages() {
        let (_temp, attic) = attic_with(&["a.300.txt.gz", "a.100.txt.gz", "b.200.txt.gz"]);
        let logs = vec![
            PageLog {
                page_id: "a".to_string(),
                records: vec![
                    record("a", 100, ChangeType::Create, "a1"),
                    record("a", 300, ChangeType::Edit, "a2"),
                ],
            },
            PageLog {
                page_id: "b".to_string(),
                records: vec![record("b", 200, ChangeType::Create, "b1")],
            },
        ];

        let result = reconcile(logs, &attic);
        let comments: Vec<&str> = result.changelog.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, ["a1", "b1", "a2"]);
        assert!(result.missing.is_empty());
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let (_temp, attic) = attic_with(&["a.100.txt.gz", "b.100.txt.gz"]);
        let logs = vec![
            PageLog {
                page_id: "b".to_string(),
                records: vec![record("b", 100, ChangeType::Create, "first")],
            },
            PageLog {
                page_id: "a".to_string(),
                records: vec![record("a", 100, ChangeType::Create, "second")],
            },
        ];

        let result = reconcile(logs, &attic);
        assert_eq!(result.changelog[0].comment, "first");
        assert_eq!(result.changelog[1].comment, "second");
    }

    #[test]
    fn test_equal_timestamps_within_one_page_keep_file_order() {
        let (_temp, attic) = attic_with(&["a.100.txt.gz", "a.200.txt.gz"]);
        let logs = vec![PageLog {
            page_id: "a".to_string(),
            records: vec![
                record("a", 200, ChangeType::Edit, "later"),
                record("a", 100, ChangeType::Edit, "first"),
                record("a", 100, ChangeType::MinorEdit, "second"),
                record("a", 100, ChangeType::Delete, "third"),
            ],
        }];

        let result = reconcile(logs, &attic);
        let comments: Vec<&str> = result.changelog.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, ["first", "second", "third", "later"]);
    }

    #[test]
    fn test_missing_snapshot_is_dropped() {
        let (_temp, attic) = attic_with(&[]);
        let logs = vec![PageLog {
            page_id: "ns:page".to_string(),
            records: vec![record("ns:page", 1000, ChangeType::Create, "created")],
        }];

        let result = reconcile(logs, &attic);
        assert!(result.changelog.is_empty());
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].page_id, "ns:page");
    }

    #[test]
    fn test_delete_needs_no_snapshot() {
        let (_temp, attic) = attic_with(&[]);
        let logs = vec![PageLog {
            page_id: "gone".to_string(),
            records: vec![record("gone", 500, ChangeType::Delete, "spam")],
        }];

        let result = reconcile(logs, &attic);
        assert_eq!(result.changelog.len(), 1);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_orphan_snapshot_is_reported() {
        let (_temp, attic) = attic_with(&["ns/page.1000.txt.gz", "ns/page.900.txt.gz", "junk.txt"]);
        let logs = vec![PageLog {
            page_id: "ns:page".to_string(),
            records: vec![record("ns:page", 1000, ChangeType::Edit, "edit")],
        }];

        let result = reconcile(logs, &attic);
        assert_eq!(result.changelog.len(), 1);
        assert_eq!(result.orphans.len(), 2);
        assert!(result
            .orphans
            .iter()
            .any(|p| p.ends_with(Path::new("ns/page.900.txt.gz"))));
        assert!(result.orphans.iter().any(|p| p.ends_with("junk.txt")));
    }
}
