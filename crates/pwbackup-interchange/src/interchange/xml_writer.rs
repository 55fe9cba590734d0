//! XML export of saved logins.
//!
//! Each record is serialized on its own before being appended, so a record
//! that cannot be written is skipped without touching the document.

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;

use pwbackup_core::{BackupError, BackupResult, ExportHeader, LoginRecord};

use super::escape::{escape_xml, is_xml_char};
use super::obfuscation::obfuscate;
use super::types::{ExportOutcome, LineBreak};

/// Write one tag with already-escaped attribute values.
pub(crate) fn write_tag(name: &str, attributes: &[(&str, String)], empty: bool) -> BackupResult<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut elem = BytesStart::new(name);
    for (key, value) in attributes {
        elem.push_attribute((key.as_bytes(), value.as_bytes()));
    }
    let event = if empty { Event::Empty(elem) } else { Event::Start(elem) };
    writer
        .write_event(event)
        .map_err(|e| BackupError::encode_failed(format!("Failed to write <{name}>: {e}")))?;
    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| BackupError::encode_failed(format!("Non UTF-8 output for <{name}>: {e}")))
}

/// Opening `<entries>` tag for a header.
pub(crate) fn entries_tag(header: &ExportHeader, with_encrypt: bool) -> BackupResult<String> {
    let mut attrs = vec![
        ("ext", escape_xml(&header.engine)),
        ("extxmlversion", escape_xml(&header.version)),
        ("type", header.kind.as_str().to_string()),
    ];
    if with_encrypt {
        attrs.push(("encrypt", header.encrypt.to_string()));
    }
    write_tag("entries", &attrs, false)
}

/// Escape a value for an attribute, refusing characters XML cannot carry.
pub(crate) fn attribute_value(field: &str, value: &str) -> BackupResult<String> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        Some(bad) => Err(BackupError::encode_failed(format!(
            "{field} contains U+{:04X}, which XML cannot represent",
            bad as u32
        ))),
        None => Ok(escape_xml(value)),
    }
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

    let attrs = [
        ("host", attribute_value("host", &record.hostname)?),
        ("user", attribute_value("user", &username)?),
        ("password", attribute_value("password", &password)?),
        ("formSubmitURL", attribute_value("formSubmitURL", record.submit_url.as_deref().unwrap_or(""))?),
        ("httpRealm", attribute_value("httpRealm", record.http_realm.as_deref().unwrap_or(""))?),
        ("userFieldName", attribute_value("userFieldName", &record.username_field)?),
        ("passFieldName", attribute_value("passFieldName", &record.password_field)?),
    ];
    write_tag("entry", &attrs, true)
}

/// Serialize saved logins as an XML export document.
pub fn encode_xml(records: &[LoginRecord], encrypt: bool, line_break: LineBreak) -> BackupResult<ExportOutcome> {
    let lb = line_break.as_str();
    let mut outcome = ExportOutcome::default();

    let mut doc = String::from("<xml>");
    doc.push_str(lb);
    doc.push_str(&entries_tag(&ExportHeader::current(encrypt), true)?);
    doc.push_str(lb);

    for record in records {
        match encode_record(record, encrypt) {
            Ok(element) => {
                doc.push_str(&element);
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

    doc.push_str("</entries>");
    doc.push_str(lb);
    doc.push_str("</xml>");
    outcome.document = doc;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_shape() {
        let record = LoginRecord::form("https://a.test", "https://a.test", "bob", "p\"w&").with_fields("u", "p");
        let out = encode_xml(&[record], false, LineBreak::Lf).unwrap();
        let expected = "<xml>\n\
<entries ext=\"Password Backup Tool\" extxmlversion=\"2.0\" type=\"saved\" encrypt=\"false\">\n\
<entry host=\"https://a.test\" user=\"bob\" password=\"p&quot;w&amp;\" formSubmitURL=\"https://a.test\" httpRealm=\"\" userFieldName=\"u\" passFieldName=\"p\"/>\n\
</entries>\n\
</xml>";
        assert_eq!(out.document, expected);
        assert_eq!(out.succeeded, 1);
        assert_eq!(out.failed, 0);
    }

    #[test]
    fn encrypt_obfuscates_username_and_password() {
        let record = LoginRecord::http_auth("https://a.test", "Admin", "bob", "secret");
        let out = encode_xml(&[record], true, LineBreak::CrLf).unwrap();
        assert!(out.document.contains("encrypt=\"true\">\r\n"));
        assert!(out.document.contains("user=\"Ym9i\" password=\"c2VjcmV0\""));
        assert!(out.document.contains("formSubmitURL=\"\" httpRealm=\"Admin\""));
    }

    #[test]
    fn unrepresentable_record_is_skipped() {
        let good = LoginRecord::form("https://a.test", "", "u", "p");
        let bad = LoginRecord::form("https://bad.test", "", "u\u{1}", "p");
        let out = encode_xml(&[good, bad], false, LineBreak::Lf).unwrap();
        assert_eq!(out.succeeded, 1);
        assert_eq!(out.failed, 1);
        assert_eq!(out.failure_log, "https://bad.test\n");
        assert!(!out.document.contains("bad.test"));
    }

    #[test]
    fn attribute_value_rejects_control_chars() {
        assert!(attribute_value("user", "ok<").is_ok());
        assert!(attribute_value("user", "\u{0}").is_err());
    }
}
