//! High-level orchestration of export and import for text documents.

use chrono::NaiveDate;
use log::info;

use pwbackup_core::{
    BackupError, BackupResult, CancelFlag, CredentialStore, InsertCursor, InsertFailure, InsertReport, LoginRecord,
    RecordKind,
};

use super::detect::detect_document;
use super::normalize::normalize_all;
use super::types::*;
use super::{csv_parser, csv_writer, disabled_hosts, xml_parser, xml_writer};

/// Logins decoded from a document, ready to be inserted.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub format: DetectedFormat,
    pub records: Vec<LoginRecord>,
    /// Entries that could not be turned into logins.
    pub rejected: Vec<InsertFailure>,
}

impl PreparedImport {
    pub fn into_cursor(self, cancel: CancelFlag) -> InsertCursor {
        InsertCursor::new(self.records, cancel).with_prior_failures(self.rejected)
    }
}

/// Validate a saved-login document and decode its entries. Nothing is
/// decoded unless the whole header checks out.
pub fn decode_document(content: &str, hint: SourceHint) -> BackupResult<(DetectedFormat, Vec<RawEntry>)> {
    if hint == SourceHint::ThirdPartyStore {
        return Err(BackupError::malformed(
            "Login databases are read by the third-party importer, not as documents",
        ));
    }
    let detected = detect_document(content, hint)?;
    let entries = match &detected.xml {
        Some(doc) => xml_parser::decode_entries(doc, detected.format),
        None => csv_parser::decode_entries(detected.content, detected.format)?,
    };
    Ok((detected.format, entries))
}

/// Default name offered for a new export file, e.g.
/// `password-export-2024-03-09.csv`.
pub fn default_file_name(kind: RecordKind, format: ExportFormat, date: NaiveDate) -> String {
    let prefix = match kind {
        RecordKind::Saved => "password-export",
        RecordKind::Rejected => "disabled-export",
    };
    format!("{prefix}-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

#[derive(Debug, Clone, Default)]
pub struct InterchangeService {
    config: InterchangeConfig,
}

impl InterchangeService {
    pub fn new(config: InterchangeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterchangeConfig {
        &self.config
    }

    // ── Export ───────────────────────────────────────────────────

    pub fn encode(&self, records: &[LoginRecord], format: ExportFormat, encrypt: bool) -> BackupResult<ExportOutcome> {
        match format {
            ExportFormat::Xml => xml_writer::encode_xml(records, encrypt, self.config.line_break),
            ExportFormat::Csv => Ok(csv_writer::encode_csv(records, encrypt, self.config.line_break)),
        }
    }

    /// Export every saved login in `store`.
    pub fn export_logins<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
        format: ExportFormat,
        encrypt: bool,
    ) -> BackupResult<ExportOutcome> {
        let records = store.enumerate_all()?;
        let outcome = self.encode(&records, format, encrypt)?;
        info!(
            "exported {} logins as {:?} ({} failed)",
            outcome.succeeded, format, outcome.failed
        );
        Ok(outcome)
    }

    pub fn export_disabled_hosts<S: CredentialStore + ?Sized>(&self, store: &S) -> BackupResult<ExportOutcome> {
        disabled_hosts::export_disabled_hosts(store, self.config.line_break)
    }

    // ── Import ───────────────────────────────────────────────────

    /// Decode and normalize a saved-login document.
    pub fn prepare_import(&self, content: &str, hint: SourceHint) -> BackupResult<PreparedImport> {
        let (format, entries) = decode_document(content, hint)?;
        let outcome = normalize_all(entries, format);
        info!(
            "prepared {} logins from {:?} ({} unusable entries)",
            outcome.records.len(),
            format,
            outcome.failures.len()
        );
        Ok(PreparedImport { format, records: outcome.records, rejected: outcome.failures })
    }

    /// Decode, normalize and insert in one go. Hosts that need progress
    /// updates or cancellation drive [`PreparedImport::into_cursor`] instead.
    pub fn import_logins<S: CredentialStore + ?Sized>(
        &self,
        store: &mut S,
        content: &str,
        hint: SourceHint,
    ) -> BackupResult<InsertReport> {
        let prepared = self.prepare_import(content, hint)?;
        Ok(prepared.into_cursor(CancelFlag::new()).run(store, |_| {}))
    }

    pub fn import_disabled_hosts<S: CredentialStore + ?Sized>(&self, store: &mut S, content: &str) -> BackupResult<InsertReport> {
        disabled_hosts::import_disabled_hosts(store, content.trim_start_matches('\u{feff}'))
    }
}
