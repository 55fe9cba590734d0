//! CSV export of saved logins: one header comment, one label line, then
//! seven quoted fields per record.

use log::warn;

use pwbackup_core::{BackupError, BackupResult, LoginRecord, CURRENT_ENGINE, CURRENT_LOGIN_VERSION};

use super::escape::csv_escape;
use super::obfuscation::obfuscate;
use super::types::{ExportOutcome, LineBreak};

pub const CSV_LABELS: &[&str] = &[
    "hostname",
    "username",
    "password",
    "formSubmitURL",
    "httpRealm",
    "usernameField",
    "passwordField",
];

fn quoted_line(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", csv_escape(f)))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_record(record: &LoginRecord, encrypt: bool) -> BackupResult<String> {
    if record.hostname.is_empty() {
        return Err(BackupError::encode_failed("Login has no hostname"));
    }
    let (username, password) = if encrypt {
        (obfuscate(&record.username), obfuscate(&record.password))
    } else {
        (record.username.clone(), record.password.clone())
    };

    let fields: [&str; 7] = [
        &record.hostname,
        &username,
        &password,
        record.submit_url.as_deref().unwrap_or(""),
        record.http_realm.as_deref().unwrap_or(""),
        &record.username_field,
        &record.password_field,
    ];
    // Records are line-delimited; a field spanning lines cannot be read back.
    if let Some((i, _)) = fields.iter().enumerate().find(|(_, f)| f.contains(['\r', '\n'])) {
        return Err(BackupError::encode_failed(format!("{} contains a line break", CSV_LABELS[i])));
    }
    Ok(quoted_line(&fields))
}

/// Serialize saved logins as a CSV export document.
pub fn encode_csv(records: &[LoginRecord], encrypt: bool, line_break: LineBreak) -> ExportOutcome {
    let lb = line_break.as_str();
    let mut outcome = ExportOutcome::default();

    let mut doc = format!("# Generated by {CURRENT_ENGINE}; Export format {CURRENT_LOGIN_VERSION}; Encrypted: {encrypt}{lb}");
    doc.push_str(&quoted_line(CSV_LABELS));
    doc.push_str(lb);

    for record in records {
        match encode_record(record, encrypt) {
            Ok(line) => {
                doc.push_str(&line);
                doc.push_str(lb);
                outcome.succeeded += 1;
            }
            Err(e) => {
                warn!("could not export login for {}: {}", record.hostname, e);
                outcome.failed += 1;
                outcome.failure_log.push_str(&record.hostname);
                outcome.failure_log.push_str(lb);
            }
        }
    }

    outcome.document = doc;
    outcome
}
