//! Export and import of the hosts for which saving logins is disabled.

use log::{info, warn};

use pwbackup_core::{BackupError, BackupResult, CredentialStore, ExportHeader, InsertFailure, InsertReport, RecordKind};

use super::detect::{validate_header, xml_header};
use super::types::{ExportOutcome, LineBreak};
use super::xml_parser::parse_document;
use super::xml_writer::{attribute_value, entries_tag, write_tag};

/// Serialize disabled hosts as a `type="rejected"` XML document.
pub fn encode_disabled_hosts(hosts: &[String], line_break: LineBreak) -> BackupResult<ExportOutcome> {
    let lb = line_break.as_str();
    let mut outcome = ExportOutcome::default();

    let mut doc = String::from("<xml>");
    doc.push_str(lb);
    doc.push_str(&entries_tag(&ExportHeader::disabled_hosts(), false)?);
    doc.push_str(lb);

    for host in hosts {
        let encoded = if host.is_empty() {
            Err(BackupError::encode_failed("Disabled host is empty"))
        } else {
            attribute_value("host", host).and_then(|v| write_tag("entry", &[("host", v)], true))
        };
        match encoded {
            Ok(element) => {
                doc.push_str(&element);
                doc.push_str(lb);
                outcome.succeeded += 1;
            }
            Err(e) => {
                warn!("could not export disabled host {:?}: {}", host, e);
                outcome.failed += 1;
                outcome.failure_log.push_str(host);
                outcome.failure_log.push_str(lb);
            }
        }
    }

    doc.push_str("</entries>");
    doc.push_str(lb);
    doc.push_str("</xml>");
    outcome.document = doc;
    Ok(outcome)
}

/// Read the hosts of a disabled-host document.
pub fn decode_disabled_hosts(content: &str) -> BackupResult<Vec<String>> {
    let doc = parse_document(content)?;
    let header = validate_header(xml_header(&doc)?, RecordKind::Rejected)?;
    info!("reading disabled hosts ({} {})", header.engine, header.version);
    Ok(doc
        .entries
        .into_iter()
        .filter_map(|mut attrs| attrs.remove("host"))
        .collect())
}

/// Export every disabled host of `store`.
pub fn export_disabled_hosts<S: CredentialStore + ?Sized>(store: &S, line_break: LineBreak) -> BackupResult<ExportOutcome> {
    let hosts = store.enumerate_disabled_hosts()?;
    encode_disabled_hosts(&hosts, line_break)
}

/// Disable saving for every host in `content`. The header is validated
/// before the store is touched; a host the store refuses does not stop the
/// rest.
pub fn import_disabled_hosts<S: CredentialStore + ?Sized>(store: &mut S, content: &str) -> BackupResult<InsertReport> {
    let hosts = decode_disabled_hosts(content)?;
    let mut report = InsertReport { total: hosts.len(), ..Default::default() };

    for host in hosts {
        let result = if host.is_empty() {
            Err(BackupError::invalid_entry("Entry has no hostname"))
        } else {
            store.set_saving_enabled(&host, false)
        };
        match result {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                let failure = InsertFailure::new(host, e);
                warn!("{}", failure.log_line());
                report.failed += 1;
                report.failures.push(failure);
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwbackup_core::{BackupErrorKind, MemoryCredentialStore};

    #[test]
    fn document_shape() {
        let out = encode_disabled_hosts(&["https://a.test".to_string()], LineBreak::Lf).unwrap();
        assert_eq!(
            out.document,
            "<xml>\n<entries ext=\"Password Backup Tool\" extxmlversion=\"1.0\" type=\"rejected\">\n\
<entry host=\"https://a.test\"/>\n</entries>\n</xml>"
        );
    }

    #[test]
    fn round_trip_through_store() {
        let mut source = MemoryCredentialStore::new();
        source.set_saving_enabled("https://a.test", false).unwrap();
        source.set_saving_enabled("https://b&c.test", false).unwrap();
        let exported = export_disabled_hosts(&source, LineBreak::CrLf).unwrap();
        assert_eq!(exported.succeeded, 2);

        let mut target = MemoryCredentialStore::new();
        let report = import_disabled_hosts(&mut target, &exported.document).unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(target.enumerate_disabled_hosts().unwrap(), source.enumerate_disabled_hosts().unwrap());
    }

    #[test]
    fn saved_login_file_is_wrong_kind() {
        let xml = r#"<xml><entries ext="Password Backup Tool" extxmlversion="2.0" type="saved" encrypt="false"></entries></xml>"#;
        let mut store = MemoryCredentialStore::new();
        let err = import_disabled_hosts(&mut store, xml).unwrap_err();
        assert_eq!(err.kind, BackupErrorKind::WrongFileKind);
    }

    #[test]
    fn empty_host_is_counted_not_fatal() {
        let xml = r#"<xml><entries ext="Password Exporter" extxmlversion="1.0" type="rejected"><entry host=""/><entry host="h"/></entries></xml>"#;
        let mut store = MemoryCredentialStore::new();
        let report = import_disabled_hosts(&mut store, xml).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failed, 1);
    }
}
