//! Page change logs and their reconciliation against the attic.
//!
//! Each wiki page has a `meta/<page path>.changes` file listing every edit
//! event. The reader turns those into [`ChangeRecord`]s, and the reconciler
//! merges all pages into one chronologically ordered [`GlobalChangelog`]
//! that only references revisions present in the attic.

mod reader;
mod reconcile;
mod record;
mod types;

pub use reader::{is_reserved_page, parse_change_line, read_change_log, RESERVED_PREFIXES};
pub use reconcile::{reconcile, GlobalChangelog, Reconciled};
pub use record::{ChangeRecord, PageLog};
pub use types::ChangeType;
