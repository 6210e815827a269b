use percent_encoding::percent_decode_str;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::record::ChangeRecord;
use super::types::ChangeType;
use crate::error::ConvertError;

/// Page id prefixes the wiki uses for internal bookkeeping (global config
/// log, discussion comments, media metadata). These are never converted.
pub const RESERVED_PREFIXES: [&str; 3] = ["_dokuwiki", "_comments", "_media"];

/// Fields in a canonical change log line:
/// `timestamp, ip, type, id, user, summary, extra`
const CHANGE_FIELDS: usize = 7;

/// Newer wiki releases append a size delta as an eighth field
const LEGACY_CHANGE_FIELDS: usize = 8;

/// Whether a page id belongs to the wiki's internal bookkeeping
pub fn is_reserved_page(page_id: &str) -> bool {
    RESERVED_PREFIXES
        .iter()
        .any(|prefix| page_id.starts_with(prefix))
}

/// Parse one tab-delimited change log line for the page `expected_page_id`.
///
/// Returns the failure detail on malformed input; the caller attaches the
/// file location.
pub fn parse_change_line(line: &str, expected_page_id: &str) -> Result<ChangeRecord, String> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    if fields.len() == LEGACY_CHANGE_FIELDS {
        fields.truncate(CHANGE_FIELDS);
    }
    if fields.len() != CHANGE_FIELDS {
        return Err(format!(
            "expected {CHANGE_FIELDS} tab-separated fields, found {}",
            fields.len()
        ));
    }

    let timestamp: i64 = fields[0]
        .parse()
        .map_err(|_| format!("invalid timestamp '{}'", fields[0]))?;

    let change_type: ChangeType = fields[2].parse()?;

    let decoded_id = percent_decode_str(fields[3])
        .decode_utf8()
        .map_err(|_| format!("page id '{}' is not valid UTF-8 once decoded", fields[3]))?;
    if decoded_id != expected_page_id {
        return Err(format!(
            "page id '{decoded_id}' does not match '{expected_page_id}' derived from the file path"
        ));
    }

    Ok(ChangeRecord {
        timestamp,
        author_ip: fields[1].to_string(),
        change_type,
        page_id: expected_page_id.to_string(),
        author_login: fields[4].to_string(),
        comment: fields[5].to_string(),
    })
}

/// Read every record of one page's change log.
///
/// Reserved pages yield an empty list without touching the file.
pub fn read_change_log(path: &Path, page_id: &str) -> Result<Vec<ChangeRecord>, ConvertError> {
    if is_reserved_page(page_id) {
        log::debug!("Skipping reserved page log {}", path.display());
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_change_line(line, page_id).map_err(|detail| {
            ConvertError::MalformedChangeRecord {
                path: path.to_path_buf(),
                line: index + 1,
                detail,
            }
        })?;
        records.push(record);
    }

    log::debug!("Read {} changes for {}", records.len(), page_id);
    Ok(records)
}
