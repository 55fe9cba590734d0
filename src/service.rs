//! # Password Backup Service
//!
//! File-level import and export on top of the interchange and Chromium
//! crates. The host supplies the credential store, the file paths and,
//! for progress and cancellation, a callback and a [`CancelFlag`].

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use pwbackup_chrome::chrome::{import_chrome_store, LoginDatabase, SecretDecryptor};
use pwbackup_core::{BackupError, BackupErrorKind, BackupResult, CancelFlag, CredentialStore, InsertProgress, InsertReport, RecordKind};
use pwbackup_interchange::interchange::{default_file_name, ExportFormat, ExportOutcome, InterchangeService, SourceHint};

use crate::config::BackupConfig;

/// An export written to disk.
#[derive(Debug, Clone)]
pub struct WrittenExport {
    pub path: PathBuf,
    pub outcome: ExportOutcome,
}

/// Decode file bytes as UTF-8, reading them as Latin-1 when they are not.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

fn read_document(path: &Path) -> BackupResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| BackupError::new(BackupErrorKind::Io, format!("Failed to read {}: {e}", path.display())))?;
    Ok(decode_text(bytes))
}

fn write_document(dir: &Path, name: &str, outcome: ExportOutcome) -> BackupResult<WrittenExport> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, &outcome.document)
        .map_err(|e| BackupError::new(BackupErrorKind::Io, format!("Failed to write {}: {e}", path.display())))?;
    if outcome.failed > 0 {
        warn!("{} entries left out of {}", outcome.failed, path.display());
    }
    info!("wrote {} entries to {}", outcome.succeeded, path.display());
    Ok(WrittenExport { path, outcome })
}

pub struct PasswordBackupService {
    config: BackupConfig,
    interchange: InterchangeService,
}

impl Default for PasswordBackupService {
    fn default() -> Self {
        Self::new(BackupConfig::default())
    }
}

impl PasswordBackupService {
    pub fn new(config: BackupConfig) -> Self {
        let interchange = InterchangeService::new(config.interchange.clone());
        Self { config, interchange }
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    // ── Saved logins ────────────────────────────────────────────

    /// Export every saved login to `dir` under the default file name for
    /// `date`. `format` and `encrypt` fall back to the configured values.
    pub fn export_logins_to_dir<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
        dir: &Path,
        format: Option<ExportFormat>,
        encrypt: Option<bool>,
        date: NaiveDate,
    ) -> BackupResult<WrittenExport> {
        let format = format.unwrap_or(self.config.interchange.default_format);
        let encrypt = encrypt.unwrap_or(self.config.interchange.encrypt);
        let outcome = self.interchange.export_logins(store, format, encrypt)?;
        write_document(dir, &default_file_name(RecordKind::Saved, format, date), outcome)
    }

    /// Import an XML or CSV export. The file extension picks the decoder;
    /// the header must validate before any login reaches `store`.
    pub fn import_logins_from_file<S, F>(
        &self,
        store: &mut S,
        path: &Path,
        cancel: CancelFlag,
        on_progress: F,
    ) -> BackupResult<InsertReport>
    where
        S: CredentialStore + ?Sized,
        F: FnMut(&InsertProgress),
    {
        let hint = SourceHint::from_path(path);
        if hint == SourceHint::ThirdPartyStore {
            return Err(BackupError::malformed(format!(
                "{} is not an XML or CSV export; login databases go through the Chrome importer",
                path.display()
            )));
        }
        let content = read_document(path)?;
        let prepared = self.interchange.prepare_import(&content, hint)?;
        let report = prepared.into_cursor(cancel).run(store, on_progress);
        info!(
            "imported {} of {} logins from {} ({} failed{})",
            report.inserted,
            report.total,
            path.display(),
            report.failed,
            if report.cancelled { ", cancelled" } else { "" }
        );
        Ok(report)
    }

    // ── Disabled hosts ──────────────────────────────────────────

    pub fn export_disabled_hosts_to_dir<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
        dir: &Path,
        date: NaiveDate,
    ) -> BackupResult<WrittenExport> {
        let outcome = self.interchange.export_disabled_hosts(store)?;
        write_document(dir, &default_file_name(RecordKind::Rejected, ExportFormat::Xml, date), outcome)
    }

    pub fn import_disabled_hosts_from_file<S: CredentialStore + ?Sized>(
        &self,
        store: &mut S,
        path: &Path,
    ) -> BackupResult<InsertReport> {
        let content = read_document(path)?;
        let report = self.interchange.import_disabled_hosts(store, &content)?;
        info!("disabled saving for {} of {} hosts", report.inserted, report.total);
        Ok(report)
    }

    // ── Chromium ────────────────────────────────────────────────

    /// Migrate the logins of a Chromium `Login Data` file into `store`.
    pub async fn import_chrome<S, DB, D, F>(
        &self,
        store: &mut S,
        db: &DB,
        decryptor: &D,
        path: &Path,
        cancel: CancelFlag,
        on_progress: F,
    ) -> BackupResult<InsertReport>
    where
        S: CredentialStore + ?Sized,
        DB: LoginDatabase + ?Sized,
        D: SecretDecryptor + ?Sized,
        F: FnMut(&InsertProgress),
    {
        let outcome = import_chrome_store(db, decryptor, path, &self.config.chrome).await?;
        let report = outcome.into_cursor(cancel).run(store, on_progress);
        info!(
            "migrated {} of {} {} logins ({} failed)",
            report.inserted, report.total, self.config.chrome.store_description, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwbackup_core::{LoginRecord, MemoryCredentialStore};
    use tracing_test::traced_test;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn source() -> MemoryCredentialStore {
        MemoryCredentialStore::with_logins(vec![
            LoginRecord::form("https://a.test", "https://a.test", "bob", "pw").with_fields("u", "p"),
            LoginRecord::http_auth("https://b.test", "Admin", "root", "toor"),
        ])
    }

    #[test]
    fn latin1_fallback() {
        assert_eq!(decode_text(b"caf\xe9".to_vec()), "café");
        assert_eq!(decode_text("café".as_bytes().to_vec()), "café");
    }

    #[test]
    #[traced_test]
    fn csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = PasswordBackupService::default();
        let written = svc
            .export_logins_to_dir(&source(), dir.path(), Some(ExportFormat::Csv), Some(false), date())
            .unwrap();
        assert_eq!(written.path, dir.path().join("password-export-2024-03-09.csv"));
        assert!(logs_contain("wrote 2 entries"));

        let mut target = MemoryCredentialStore::new();
        let mut seen = Vec::new();
        let report = svc
            .import_logins_from_file(&mut target, &written.path, CancelFlag::new(), |p| seen.push(p.percentage))
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(seen, vec![50, 100]);
        assert_eq!(target.logins(), source().logins());
    }

    #[test]
    fn configured_format_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let svc = PasswordBackupService::default();
        let written = svc.export_logins_to_dir(&source(), dir.path(), None, None, date()).unwrap();
        assert_eq!(written.path.extension().unwrap(), "xml");
        assert!(written.outcome.document.contains(r#"encrypt="true""#));
    }

    #[test]
    fn unknown_extension_is_refused_before_reading() {
        let svc = PasswordBackupService::default();
        let mut store = MemoryCredentialStore::new();
        let err = svc
            .import_logins_from_file(&mut store, Path::new("/nonexistent/Login Data"), CancelFlag::new(), |_| {})
            .unwrap_err();
        assert_eq!(err.kind, BackupErrorKind::MalformedDocument);
    }

    #[test]
    fn missing_file_is_io_error() {
        let svc = PasswordBackupService::default();
        let mut store = MemoryCredentialStore::new();
        let err = svc
            .import_logins_from_file(&mut store, Path::new("/nonexistent/backup.xml"), CancelFlag::new(), |_| {})
            .unwrap_err();
        assert_eq!(err.kind, BackupErrorKind::Io);
    }

    #[test]
    fn disabled_hosts_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = PasswordBackupService::default();
        let mut source = MemoryCredentialStore::new();
        source.set_saving_enabled("https://never.test", false).unwrap();

        let written = svc.export_disabled_hosts_to_dir(&source, dir.path(), date()).unwrap();
        assert!(written.path.ends_with("disabled-export-2024-03-09.xml"));

        let mut target = MemoryCredentialStore::new();
        let report = svc.import_disabled_hosts_from_file(&mut target, &written.path).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(target.enumerate_disabled_hosts().unwrap(), vec!["https://never.test".to_string()]);
    }
}
