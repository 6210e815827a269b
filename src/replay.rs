//! History replay: one commit per surviving changelog entry.

use std::path::PathBuf;

use crate::attic::AtticIndex;
use crate::changelog::ChangeRecord;
use crate::config::Settings;
use crate::ops::{Author, Operation, Step, Transform};
use crate::users::UserDirectory;

/// Turns the global changelog into repository mutation steps
pub struct HistoryReplayer<'a> {
    users: &'a UserDirectory,
    settings: &'a Settings,
    attic: &'a AtticIndex,
}

impl<'a> HistoryReplayer<'a> {
    pub fn new(users: &'a UserDirectory, settings: &'a Settings, attic: &'a AtticIndex) -> Self {
        Self {
            users,
            settings,
            attic,
        }
    }

    /// Steps for every record, in changelog order
    pub fn replay(&self, changelog: &[ChangeRecord]) -> Vec<Step> {
        let mut steps = Vec::new();
        for record in changelog {
            steps.extend(self.steps_for(record));
        }
        log::info!(
            "Planned {} history commits ({} steps)",
            changelog.len(),
            steps.len()
        );
        steps
    }

    /// Author of a record: the tool identity for anonymous edits, the user
    /// directory entry for known logins, otherwise the raw login with an
    /// address derived from the editor's IP.
    pub fn resolve_author(&self, record: &ChangeRecord) -> Author {
        if record.author_login.is_empty() {
            return self.settings.identity.clone();
        }

        match self.users.get(&record.author_login) {
            Some(user) => Author::new(&user.display_name, &user.email),
            None => Author::new(
                &record.author_login,
                format!("{}@{}", self.settings.email_service, record.author_ip),
            ),
        }
    }

    /// Working tree path of a page, relative to the repository root
    pub fn destination(&self, record: &ChangeRecord) -> PathBuf {
        PathBuf::from(format!("{}{}", record.page_path(), self.settings.extension))
    }

    fn steps_for(&self, record: &ChangeRecord) -> Vec<Step> {
        let dst = self.destination(record);
        let mut steps = Vec::new();

        if record.change_type.is_content_bearing() {
            let Some(snapshot) = self.attic.get(&record.page_id, record.timestamp) else {
                log::warn!(
                    "No attic snapshot for {} at {}, revision skipped",
                    record.page_id,
                    record.timestamp
                );
                return Vec::new();
            };

            if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
                steps.push(Step::required(Operation::CreateDirectory {
                    path: parent.to_path_buf(),
                }));
            }

            steps.push(Step::required(Operation::MaterializeFile {
                src: snapshot.to_path_buf(),
                dst: dst.clone(),
                transform: Transform::Decompress,
            }));

            // A failed conversion leaves the raw wiki text in place.
            if let Some(format) = &self.settings.convert_format {
                steps.push(Step::best_effort(Operation::MaterializeFile {
                    src: dst.clone(),
                    dst: dst.clone(),
                    transform: Transform::Convert {
                        format: format.clone(),
                    },
                }));
            }

            steps.push(Step::required(Operation::StageForCommit { path: dst }));
        } else {
            steps.push(Step::best_effort(Operation::RemoveFile { path: dst }));
        }

        if record.date().is_none() {
            log::warn!(
                "Timestamp {} of {} is out of range, committing with the current time",
                record.timestamp,
                record.page_id
            );
        }

        steps.push(Step::best_effort(Operation::Commit {
            author: self.resolve_author(record),
            date: record.date(),
            message: format!("{}: {}", record.page_id, record.comment),
            allow_empty: false,
        }));

        steps
    }
}
