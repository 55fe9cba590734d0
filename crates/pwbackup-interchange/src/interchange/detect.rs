//! Header detection and layout classification.
//!
//! Every document is fully validated here before any record is decoded:
//! engine first, then record kind, then (for saved logins) schema version.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use pwbackup_core::{
    BackupError, BackupResult, ExportHeader, RecordKind, CURRENT_ENGINE, CURRENT_LOGIN_VERSION, LEGACY_ENGINE,
};

use super::csv_parser;
use super::types::{DetectedFormat, LegacyVersion, SourceHint};
use super::xml_parser::{self, XmlDocument};

lazy_static! {
    static ref CSV_HEADER: Regex =
        Regex::new(r"(?i)# Generated by (.+); Export format (.{3,6}); Encrypted: (true|false)").unwrap();
    static ref CSV_LEGACY_HEADER: Regex = Regex::new(r"(?i)(.+?),(.{3,6}),(true|false)").unwrap();
}

/// Header values exactly as found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFields {
    pub engine: String,
    pub version: String,
    pub kind: String,
    pub encrypt: bool,
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Header of an XML document, taken from its first `<entries>` element.
pub fn xml_header(doc: &XmlDocument) -> BackupResult<HeaderFields> {
    let attrs = doc
        .header
        .as_ref()
        .ok_or_else(|| BackupError::malformed("No <entries> element in document"))?;
    let get = |key: &str| attrs.get(key).cloned().unwrap_or_default();
    Ok(HeaderFields {
        engine: get("ext"),
        version: get("extxmlversion"),
        kind: get("type"),
        encrypt: attrs.get("encrypt").map_or(false, |v| parse_flag(v)),
    })
}

/// Header of a CSV document, from its first line. CSV exports only ever
/// hold saved logins.
pub fn csv_header(content: &str) -> BackupResult<HeaderFields> {
    let lines = csv_parser::split_lines(content);
    let first_line = lines.first().copied().unwrap_or("");
    let caps = CSV_HEADER
        .captures(first_line)
        .or_else(|| CSV_LEGACY_HEADER.captures(first_line))
        .ok_or_else(|| BackupError::malformed("No export header on the first line"))?;
    Ok(HeaderFields {
        engine: caps[1].trim().to_string(),
        version: caps[2].trim().to_string(),
        kind: RecordKind::Saved.as_str().to_string(),
        encrypt: parse_flag(&caps[3]),
    })
}

/// Check engine and record kind. Versions are checked separately because
/// disabled-host documents accept any version from a known engine.
pub fn validate_header(fields: HeaderFields, expected: RecordKind) -> BackupResult<ExportHeader> {
    if fields.engine != CURRENT_ENGINE && fields.engine != LEGACY_ENGINE {
        return Err(BackupError::unsupported_engine(&fields.engine));
    }
    match RecordKind::parse(&fields.kind) {
        Some(kind) if kind == expected => Ok(ExportHeader {
            engine: fields.engine,
            version: fields.version,
            kind,
            encrypt: fields.encrypt,
        }),
        _ => Err(BackupError::wrong_kind(expected.as_str(), &fields.kind)),
    }
}

/// Decide how a saved-login document is laid out.
pub fn classify(header: &ExportHeader, hint: SourceHint) -> BackupResult<DetectedFormat> {
    let encrypt = header.encrypt;
    if header.is_legacy_engine() {
        let version = LegacyVersion::parse(&header.version)
            .ok_or_else(|| BackupError::unsupported_version(&header.engine, &header.version))?;
        return match hint {
            SourceHint::Xml => Ok(DetectedFormat::XmlLegacy { version, encrypt }),
            SourceHint::Csv if version.is_pre_1_1() => Ok(DetectedFormat::CsvLegacyPre11 { version, encrypt }),
            SourceHint::Csv => Ok(DetectedFormat::CsvCurrentOrLegacy11 { legacy_engine: true, encrypt }),
            SourceHint::ThirdPartyStore => Ok(DetectedFormat::ThirdPartyStore),
        };
    }

    if header.version != CURRENT_LOGIN_VERSION {
        return Err(BackupError::unsupported_version(&header.engine, &header.version));
    }
    Ok(match hint {
        SourceHint::Xml => DetectedFormat::XmlCurrent { encrypt },
        SourceHint::Csv => DetectedFormat::CsvCurrentOrLegacy11 { legacy_engine: false, encrypt },
        SourceHint::ThirdPartyStore => DetectedFormat::ThirdPartyStore,
    })
}

/// A saved-login document whose header has been validated.
#[derive(Debug, Clone)]
pub struct DetectedDocument<'a> {
    pub format: DetectedFormat,
    /// Text with any byte-order mark removed.
    pub content: &'a str,
    /// Parsed form of XML documents, so entries are read without parsing
    /// twice.
    pub xml: Option<XmlDocument>,
}

/// Validate the header of a saved-login document and classify its layout.
pub fn detect_document(content: &str, hint: SourceHint) -> BackupResult<DetectedDocument<'_>> {
    let content = content.trim_start_matches('\u{feff}');
    let (fields, xml) = match hint {
        SourceHint::ThirdPartyStore => {
            return Ok(DetectedDocument { format: DetectedFormat::ThirdPartyStore, content, xml: None })
        }
        SourceHint::Xml => {
            let doc = xml_parser::parse_document(content)?;
            (xml_header(&doc)?, Some(doc))
        }
        SourceHint::Csv => (csv_header(content)?, None),
    };
    let header = validate_header(fields, RecordKind::Saved)?;
    let format = classify(&header, hint)?;
    debug!("detected {:?} ({} {})", format, header.engine, header.version);
    Ok(DetectedDocument { format, content, xml })
}

/// Detect the layout of a saved-login document.
pub fn detect(content: &str, hint: SourceHint) -> BackupResult<DetectedFormat> {
    detect_document(content, hint).map(|detected| detected.format)
}
