//! Mapping of Chromium login rows onto saved-login records.

use log::{info, warn};
use std::path::Path;
use url::Url;

use pwbackup_core::{BackupError, BackupResult, InsertFailure, LoginRecord};

use super::decrypt::{DecryptSession, SecretDecryptor};
use super::reader::{fetch_rows_with_retry, LoginDatabase};
use super::types::{AuthScheme, ChromeImportConfig, ChromeImportOutcome, LoginRow};

/// `scheme://[user[:password]@]host[:port]` of `raw`, with the port left
/// out when it is the scheme's default.
pub fn pre_path(raw: &str) -> BackupResult<String> {
    let url = Url::parse(raw).map_err(|e| BackupError::invalid_entry(format!("Invalid URL {raw:?}: {e}")))?;
    let Some(host) = url.host_str() else {
        return Ok(format!("{}:", url.scheme()));
    };

    let mut out = format!("{}://", url.scheme());
    if !url.username().is_empty() {
        out.push_str(url.username());
        if let Some(password) = url.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }
    out.push_str(host);
    if let Some(port) = url.port() {
        out.push_str(&format!(":{port}"));
    }
    Ok(out)
}

/// Turn one row into a login record. `signon_realm` of an HTTP-auth row is
/// `<origin>/<realm>`; the origin and one separator are dropped.
pub fn map_row<D: SecretDecryptor + ?Sized>(row: &LoginRow, session: &mut DecryptSession<'_, D>) -> BackupResult<LoginRecord> {
    let scheme = AuthScheme::from_tag(row.scheme)?;
    let hostname = pre_path(&row.origin_url)?;
    let password = session.decrypt(&row.password_value)?;

    let mut record = LoginRecord {
        hostname,
        username: row.username_value.clone(),
        password,
        submit_url: None,
        http_realm: None,
        username_field: row.username_element.clone(),
        password_field: row.password_element.clone(),
    };

    match scheme {
        AuthScheme::HtmlForm => {
            record.submit_url = Some(if row.action_url.is_empty() {
                String::new()
            } else {
                pre_path(&row.action_url)?
            });
        }
        AuthScheme::Basic | AuthScheme::Digest => {
            let realm = row
                .signon_realm
                .get(record.hostname.len() + 1..)
                .unwrap_or_default()
                .to_string();
            record.http_realm = Some(realm);
        }
    }
    Ok(record)
}

/// Map every row with one decryptor session. A row that fails is logged and
/// kept as a failure; the session is closed once at the end either way.
pub fn import_rows<D: SecretDecryptor + ?Sized>(rows: &[LoginRow], decryptor: &D) -> BackupResult<ChromeImportOutcome> {
    let mut session = DecryptSession::open(decryptor)?;
    let mut outcome = ChromeImportOutcome::default();

    for row in rows {
        match map_row(row, &mut session) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                let failure = InsertFailure::new(row.origin_url.clone(), e);
                warn!("skipping login row: {}", failure.log_line());
                outcome.failures.push(failure);
            }
        }
    }
    Ok(outcome)
}

/// Read the login database at `path` and map its rows.
pub async fn import_chrome_store<DB, D>(
    db: &DB,
    decryptor: &D,
    path: &Path,
    config: &ChromeImportConfig,
) -> BackupResult<ChromeImportOutcome>
where
    DB: LoginDatabase + ?Sized,
    D: SecretDecryptor + ?Sized,
{
    let rows = fetch_rows_with_retry(db, path, config).await?;
    let outcome = import_rows(&rows, decryptor)?;
    info!(
        "mapped {} of {} {} logins",
        outcome.records.len(),
        rows.len(),
        config.store_description
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::decrypt::testing::{encrypt_v10, PlainDecryptor};
    use crate::chrome::decrypt::LinuxV10Decryptor;
    use crate::chrome::sqlite::fixtures::write_login_data;
    use crate::chrome::sqlite::SqliteLoginDatabase;
    use pwbackup_core::{BackupErrorKind, CancelFlag, CredentialStore, MemoryCredentialStore};

    fn row(origin: &str, action: &str, realm: &str, scheme: i64) -> LoginRow {
        LoginRow {
            origin_url: origin.into(),
            action_url: action.into(),
            username_element: "user".into(),
            username_value: "bob".into(),
            password_element: "pass".into(),
            password_value: b"pw".to_vec(),
            signon_realm: realm.into(),
            scheme,
            ..Default::default()
        }
    }

    #[test]
    fn pre_path_forms() {
        assert_eq!(pre_path("https://a.test/login?x=1").unwrap(), "https://a.test");
        assert_eq!(pre_path("https://a.test:443/").unwrap(), "https://a.test");
        assert_eq!(pre_path("http://a.test:8080/x").unwrap(), "http://a.test:8080");
        assert_eq!(pre_path("ftp://me:pw@a.test/").unwrap(), "ftp://me:pw@a.test");
        assert!(pre_path("not a url").is_err());
    }

    #[test]
    fn form_row_keeps_submit_origin() {
        let dec = PlainDecryptor::default();
        let mut session = DecryptSession::open(&dec).unwrap();
        let rec = map_row(&row("https://a.test/login", "https://a.test/post?x", "https://a.test/", 0), &mut session).unwrap();
        assert_eq!(rec.hostname, "https://a.test");
        assert_eq!(rec.submit_url.as_deref(), Some("https://a.test"));
        assert_eq!(rec.http_realm, None);
        assert_eq!(rec.username_field, "user");
        assert_eq!(rec.password, "pw");
    }

    #[test]
    fn http_auth_realm_drops_origin() {
        let dec = PlainDecryptor::default();
        let mut session = DecryptSession::open(&dec).unwrap();
        let basic = map_row(&row("https://a.test/", "", "https://a.test/Admin Area", 1), &mut session).unwrap();
        assert_eq!(basic.http_realm.as_deref(), Some("Admin Area"));
        assert_eq!(basic.submit_url, None);
        let digest = map_row(&row("http://b.test:8080/", "", "http://b.test:8080/", 2), &mut session).unwrap();
        assert_eq!(digest.http_realm.as_deref(), Some(""));
    }

    #[test]
    fn empty_action_maps_to_empty_submit() {
        let dec = PlainDecryptor::default();
        let mut session = DecryptSession::open(&dec).unwrap();
        let rec = map_row(&row("https://a.test/", "", "https://a.test/", 0), &mut session).unwrap();
        assert_eq!(rec.submit_url.as_deref(), Some(""));
    }

    #[test]
    fn bad_rows_are_skipped_and_session_closed_once() {
        let rows = vec![
            row("https://a.test/", "https://a.test/", "https://a.test/", 0),
            row("https://b.test/", "", "https://b.test/", 4),
            row("::nope::", "", "", 0),
            row("https://c.test/", "", "https://c.test/r", 1),
        ];
        let dec = PlainDecryptor::default();
        let outcome = import_rows(&rows, &dec).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].error.kind, BackupErrorKind::UnsupportedAuthScheme);
        assert_eq!(dec.closed.get(), 1);
    }

    #[tokio::test]
    async fn imports_sqlite_store_into_credential_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Login Data");
        write_login_data(
            &path,
            &[
                ("https://a.test/login", "https://a.test/post", "bob", encrypt_v10("hunter2"), "https://a.test/", 0, 0),
                ("https://b.test/", "", "root", encrypt_v10("toor"), "https://b.test/Admin", 1, 0),
                ("https://c.test/", "", "x", encrypt_v10("never"), "https://c.test/", 0, 1),
                ("https://d.test/", "", "y", b"garbage".to_vec(), "https://d.test/", 0, 0),
            ],
        )
        .await;

        let dec = LinuxV10Decryptor::new();
        let outcome = import_chrome_store(&SqliteLoginDatabase::new(), &dec, &path, &ChromeImportConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.failures.len(), 1);

        let mut store = MemoryCredentialStore::new();
        let report = outcome.into_cursor(CancelFlag::new()).run(&mut store, |_| {});
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);

        let saved = store.enumerate_all().unwrap();
        let basic = saved.iter().find(|r| r.hostname == "https://b.test").unwrap();
        assert_eq!(basic.password, "toor");
        assert_eq!(basic.http_realm.as_deref(), Some("Admin"));
        assert_eq!(basic.submit_url, None);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_file_exhausts_retries() {
        let dir = tempfile::tempdir().unwrap();
        let dec = PlainDecryptor::default();
        let err = import_chrome_store(
            &SqliteLoginDatabase::new(),
            &dec,
            &dir.path().join("absent"),
            &ChromeImportConfig::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, BackupErrorKind::StoreUnavailable);
        assert_eq!(dec.opened.get(), 0);
    }
}
