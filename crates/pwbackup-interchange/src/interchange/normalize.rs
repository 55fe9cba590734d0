//! Turns decoded entries into canonical login records.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use pwbackup_core::{BackupError, BackupResult, InsertFailure, LoginRecord};

use super::obfuscation::deobfuscate;
use super::types::{DetectedFormat, RawEntry};
use super::upgrade::upgrade_entry;

lazy_static! {
    static ref HOST_WITH_REALM: Regex = Regex::new(r"(.*) \((.*)\)").unwrap();
}

/// Records ready for insertion plus the entries that could not be used.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<LoginRecord>,
    pub failures: Vec<InsertFailure>,
}

/// Normalize one entry. May yield more than one record.
pub fn normalize_entry(raw: RawEntry, format: DetectedFormat) -> BackupResult<Vec<LoginRecord>> {
    let RawEntry { hostname, mut username, mut password, submit_url, http_realm, username_field, password_field } = raw;

    if format.encrypt() {
        password = password.as_deref().map(deobfuscate).transpose()?;
        if format.obfuscates_usernames() {
            username = username.as_deref().map(deobfuscate).transpose()?;
        }
    }

    let hostname = hostname
        .filter(|h| !h.is_empty())
        .ok_or_else(|| BackupError::invalid_entry("Entry has no hostname"))?;

    let mut record = LoginRecord {
        hostname,
        username: username.unwrap_or_default(),
        password: password.unwrap_or_default(),
        submit_url,
        http_realm,
        username_field,
        password_field,
    };

    // Old exports folded the realm into the hostname as "host (realm)".
    if record.http_realm.as_deref().map_or(true, str::is_empty) {
        if let Some(caps) = HOST_WITH_REALM.captures(&record.hostname) {
            let (host, realm) = (caps[1].to_string(), caps[2].to_string());
            record.hostname = host;
            record.http_realm = Some(realm);
        }
    }

    let mut records = upgrade_entry(record);
    for r in &mut records {
        r.enforce_exclusivity();
    }
    Ok(records)
}

/// Normalize a batch. Unusable entries are logged by hostname and
/// collected; they never stop the batch.
pub fn normalize_all(entries: Vec<RawEntry>, format: DetectedFormat) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    for raw in entries {
        let host = raw.display_host().to_string();
        match normalize_entry(raw, format) {
            Ok(records) => outcome.records.extend(records),
            Err(e) => {
                warn!("skipping entry for {}: {}", host, e);
                outcome.failures.push(InsertFailure::new(host, e));
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::obfuscation::obfuscate;
    use crate::interchange::types::LegacyVersion;
    use pwbackup_core::BackupErrorKind;

    const PLAIN: DetectedFormat = DetectedFormat::XmlCurrent { encrypt: false };

    fn raw(host: &str) -> RawEntry {
        RawEntry { hostname: Some(host.into()), ..Default::default() }
    }

    #[test]
    fn realm_moves_out_of_hostname() {
        let out = normalize_entry(raw("example.com (My Realm)"), PLAIN).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].hostname, "example.com");
        assert_eq!(out[0].http_realm.as_deref(), Some("My Realm"));
    }

    #[test]
    fn explicit_realm_is_not_overridden() {
        let mut entry = raw("https://a.test (ignored)");
        entry.http_realm = Some("Real".into());
        let out = normalize_entry(entry, PLAIN).unwrap();
        assert_eq!(out[0].http_realm.as_deref(), Some("Real"));
    }

    #[test]
    fn nulls_become_empty_strings() {
        let out = normalize_entry(raw("https://a.test"), PLAIN).unwrap();
        assert_eq!(out[0].username, "");
        assert_eq!(out[0].password, "");
    }

    #[test]
    fn realm_drops_submit_url() {
        let mut entry = raw("https://a.test");
        entry.submit_url = Some("https://a.test".into());
        entry.http_realm = Some("Admin".into());
        let out = normalize_entry(entry, PLAIN).unwrap();
        assert_eq!(out[0].submit_url, None);
    }

    #[test]
    fn empty_submit_sentinel_survives() {
        let mut entry = raw("https://a.test");
        entry.submit_url = Some(String::new());
        entry.username_field = "user".into();
        let fmt = DetectedFormat::XmlLegacy { version: LegacyVersion::V1_0_4, encrypt: false };
        let out = normalize_entry(entry, fmt).unwrap();
        assert_eq!(out[0].submit_url.as_deref(), Some(""));
    }

    #[test]
    fn deobfuscates_both_fields() {
        let mut entry = raw("https://a.test");
        entry.username = Some(obfuscate("bob"));
        entry.password = Some(obfuscate("s3cret"));
        let out = normalize_entry(entry, DetectedFormat::XmlCurrent { encrypt: true }).unwrap();
        assert_eq!(out[0].username, "bob");
        assert_eq!(out[0].password, "s3cret");
    }

    #[test]
    fn version_1_0_2_keeps_plain_username() {
        let mut entry = raw("https://a.test");
        entry.username = Some("bob".into());
        entry.password = Some(obfuscate("pw"));
        let fmt = DetectedFormat::CsvLegacyPre11 { version: LegacyVersion::V1_0_2, encrypt: true };
        let out = normalize_entry(entry, fmt).unwrap();
        assert_eq!(out[0].username, "bob");
        assert_eq!(out[0].password, "pw");
    }

    #[test]
    fn channel_login_splits_into_two() {
        let out = normalize_entry(raw("proxy.test:3128 (Squid)"), PLAIN).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.http_realm.as_deref() == Some("Squid") && r.submit_url.is_none()));
    }

    #[test]
    fn batch_collects_failures() {
        let mut bad = raw("https://b.test");
        bad.password = Some("%%%".into());
        let entries = vec![raw("https://a.test"), RawEntry::default(), bad];
        let outcome = normalize_all(entries, DetectedFormat::XmlCurrent { encrypt: true });
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[1].hostname, "https://b.test");

        let entries = vec![raw("https://a.test"), RawEntry::default()];
        let outcome = normalize_all(entries, PLAIN);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures[0].hostname, "(no hostname)");
        assert_eq!(outcome.failures[0].error.kind, BackupErrorKind::InvalidEntry);
    }
}
