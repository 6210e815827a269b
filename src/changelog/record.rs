use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::ChangeType;

/// One edit event from a page change log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    /// Epoch seconds of the edit
    pub timestamp: i64,

    /// Address the edit was made from
    pub author_ip: String,

    pub change_type: ChangeType,

    /// Colon-separated page identifier, e.g. `wiki:syntax`
    pub page_id: String,

    /// Login of the editor; empty for anonymous edits
    pub author_login: String,

    /// Edit summary
    pub comment: String,
}

impl ChangeRecord {
    /// The edit time as a UTC date, if the timestamp is representable
    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Page identifier rewritten as a relative path (`wiki:syntax` -> `wiki/syntax`)
    pub fn page_path(&self) -> String {
        self.page_id.replace(':', "/")
    }
}

/// All records read from one page's change log, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLog {
    pub page_id: String,
    pub records: Vec<ChangeRecord>,
}
