//! CSV reader for saved-login exports.
//!
//! Two layouts exist:
//! - 1.0.2 / 1.0.4: one header line, then five unquoted columns
//!   (hostname, username, password, username field, password field)
//! - 1.1 / 2.0: a header line and a label line, then seven quoted columns
//!   (hostname, username, password, submit URL, realm, username field,
//!   password field)

use pwbackup_core::{BackupError, BackupResult};

use super::escape::{split_quoted_csv_line, unescape_legacy};
use super::types::{DetectedFormat, RawEntry};

/// Split a document into lines using the first line-break style found:
/// `\r\n`, then `\r`, then `\n`.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.contains("\r\n") {
        content.split("\r\n").collect()
    } else if content.contains('\r') {
        content.split('\r').collect()
    } else {
        content.split('\n').collect()
    }
}

/// Lines carrying records, after the header lines. The terminating line
/// break leaves an empty last element, which is never a record.
fn record_lines(content: &str, header_lines: usize) -> Vec<&str> {
    split_lines(content)
        .into_iter()
        .skip(header_lines)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Decode every record line of a CSV export.
pub fn decode_entries(content: &str, format: DetectedFormat) -> BackupResult<Vec<RawEntry>> {
    match format {
        DetectedFormat::CsvLegacyPre11 { .. } => decode_unquoted(content),
        DetectedFormat::CsvCurrentOrLegacy11 { legacy_engine, .. } => Ok(decode_quoted(content, legacy_engine)),
        other => Err(BackupError::malformed(format!("{other:?} is not a CSV layout"))),
    }
}

fn decode_unquoted(content: &str) -> BackupResult<Vec<RawEntry>> {
    let body = record_lines(content, 1).join("\n");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(body.as_bytes());

    let mut entries = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| BackupError::malformed(format!("CSV read error: {e}")))?;
        let field = |i: usize| record.get(i).map(unescape_legacy).unwrap_or_default();
        let hostname = field(0);
        entries.push(RawEntry {
            hostname: (!hostname.is_empty()).then_some(hostname),
            username: Some(field(1)),
            password: Some(field(2)),
            submit_url: Some(String::new()),
            http_realm: None,
            username_field: field(3),
            password_field: field(4),
        });
    }
    Ok(entries)
}

fn decode_quoted(content: &str, legacy_engine: bool) -> Vec<RawEntry> {
    record_lines(content, 2)
        .into_iter()
        .map(|line| {
            let fields = split_quoted_csv_line(line);
            let field = |i: usize| {
                let raw = fields.get(i).map(String::as_str).unwrap_or("");
                if legacy_engine {
                    unescape_legacy(raw)
                } else {
                    raw.to_string()
                }
            };
            let optional = |i: usize| Some(field(i)).filter(|s| !s.is_empty());
            RawEntry {
                hostname: optional(0),
                username: Some(field(1)),
                password: Some(field(2)),
                submit_url: optional(3),
                http_realm: optional(4),
                username_field: field(5),
                password_field: field(6),
            }
        })
        .collect()
}
