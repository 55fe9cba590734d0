//! XML reader for saved-login and disabled-host documents.
//!
//! The document is read in full before anything is returned, so a parse
//! error anywhere rejects the whole file:
//! - the first `<entries>` element supplies the header attributes
//! - every `<entry>` element becomes one attribute map

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::str;

use pwbackup_core::{BackupError, BackupResult};

use super::escape::{unescape_legacy, unescape_xml};
use super::types::{DetectedFormat, RawEntry};

pub type AttributeMap = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct XmlDocument {
    pub header: Option<AttributeMap>,
    pub entries: Vec<AttributeMap>,
}

/// Parse a whole export document.
pub fn parse_document(xml_content: &str) -> BackupResult<XmlDocument> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut doc = XmlDocument::default();
    let mut depth = 0usize;
    let mut saw_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                saw_element = true;
                collect_element(e, &mut doc)?;
            }
            Ok(Event::Empty(ref e)) => {
                saw_element = true;
                collect_element(e, &mut doc)?;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(BackupError::malformed(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !saw_element {
        return Err(BackupError::malformed("Document contains no XML elements"));
    }
    if depth != 0 {
        return Err(BackupError::malformed("Document ends before all elements are closed"));
    }
    Ok(doc)
}

fn collect_element(e: &BytesStart, doc: &mut XmlDocument) -> BackupResult<()> {
    match e.name().as_ref() {
        b"entries" if doc.header.is_none() => doc.header = Some(read_attributes(e)?),
        b"entry" => doc.entries.push(read_attributes(e)?),
        _ => {}
    }
    Ok(())
}

fn read_attributes(e: &BytesStart) -> BackupResult<AttributeMap> {
    let mut map = AttributeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| BackupError::malformed(format!("Bad attribute: {e}")))?;
        let key = str::from_utf8(attr.key.as_ref())
            .map_err(|_| BackupError::malformed("Invalid UTF-8 in attribute name"))?;
        let raw = str::from_utf8(&attr.value)
            .map_err(|_| BackupError::malformed(format!("Invalid UTF-8 in attribute {key}")))?;
        map.insert(key.to_string(), unescape_xml(raw)?.into_owned());
    }
    Ok(map)
}

/// Turn `<entry>` attribute maps into raw entries for the given layout.
pub fn decode_entries(doc: &XmlDocument, format: DetectedFormat) -> Vec<RawEntry> {
    let legacy = format.legacy_version();
    // 1.0.x files never wrote a submit URL; their logins match any form.
    let empty_submit = legacy.filter(|v| v.is_pre_1_1()).map(|_| String::new());

    doc.entries
        .iter()
        .map(|attrs| {
            let value = |key: &str| {
                attrs.get(key).map(|v| match legacy {
                    Some(_) => unescape_legacy(v),
                    None => v.clone(),
                })
            };
            RawEntry {
                hostname: value("host"),
                username: value("user"),
                password: value("password"),
                // A present but empty attribute is the "any form" login.
                submit_url: value("formSubmitURL").or_else(|| empty_submit.clone()),
                http_realm: value("httpRealm").filter(|s| !s.is_empty()),
                username_field: value("userFieldName").unwrap_or_default(),
                password_field: value("passFieldName").unwrap_or_default(),
            }
        })
        .collect()
}
