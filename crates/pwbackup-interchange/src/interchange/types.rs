//! Data structures for the interchange documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ── Versions & detected layouts ─────────────────────────────────────

/// Schema versions written by the predecessor engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyVersion {
    V1_0_2,
    V1_0_4,
    V1_1,
}

impl LegacyVersion {
    pub fn parse(version: &str) -> Option<Self> {
        match version {
            "1.0.2" => Some(Self::V1_0_2),
            "1.0.4" => Some(Self::V1_0_4),
            "1.1" => Some(Self::V1_1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0_2 => "1.0.2",
            Self::V1_0_4 => "1.0.4",
            Self::V1_1 => "1.1",
        }
    }

    /// 1.0.2 and 1.0.4 predate quoting and the submit-URL column.
    pub fn is_pre_1_1(&self) -> bool {
        !matches!(self, Self::V1_1)
    }
}

impl fmt::Display for LegacyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout of a saved-login document, decided once from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedFormat {
    XmlCurrent { encrypt: bool },
    XmlLegacy { version: LegacyVersion, encrypt: bool },
    /// Seven quoted columns, two header lines. `legacy_engine` marks 1.1
    /// files whose values are additionally percent-escaped.
    CsvCurrentOrLegacy11 { legacy_engine: bool, encrypt: bool },
    /// Five unquoted columns, one header line.
    CsvLegacyPre11 { version: LegacyVersion, encrypt: bool },
    /// A third-party browser's login database.
    ThirdPartyStore,
}

impl DetectedFormat {
    pub fn encrypt(&self) -> bool {
        match self {
            Self::XmlCurrent { encrypt }
            | Self::XmlLegacy { encrypt, .. }
            | Self::CsvCurrentOrLegacy11 { encrypt, .. }
            | Self::CsvLegacyPre11 { encrypt, .. } => *encrypt,
            Self::ThirdPartyStore => false,
        }
    }

    pub fn legacy_version(&self) -> Option<LegacyVersion> {
        match self {
            Self::XmlLegacy { version, .. } | Self::CsvLegacyPre11 { version, .. } => Some(*version),
            Self::CsvCurrentOrLegacy11 { legacy_engine: true, .. } => Some(LegacyVersion::V1_1),
            _ => None,
        }
    }

    /// Values written by the predecessor engine are percent-escaped.
    pub fn is_legacy_engine(&self) -> bool {
        self.legacy_version().is_some()
    }

    /// Version 1.0.2 obfuscated passwords only.
    pub fn obfuscates_usernames(&self) -> bool {
        self.encrypt() && self.legacy_version() != Some(LegacyVersion::V1_0_2)
    }
}

/// Where an import file came from, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceHint {
    Xml,
    Csv,
    ThirdPartyStore,
}

impl SourceHint {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => Self::Xml,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::ThirdPartyStore,
        }
    }
}

// ── Export options ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xml,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Csv => "csv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineBreak {
    #[default]
    Lf,
    CrLf,
}

impl LineBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// The host platform's native line break.
    pub fn native() -> Self {
        if cfg!(windows) {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

/// Interchange settings loaded from the application config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterchangeConfig {
    pub line_break: LineBreak,
    pub default_format: ExportFormat,
    /// Obfuscate usernames and passwords in new exports.
    pub encrypt: bool,
}

impl Default for InterchangeConfig {
    fn default() -> Self {
        Self {
            line_break: LineBreak::native(),
            default_format: ExportFormat::Xml,
            encrypt: true,
        }
    }
}

// ── Decoded and encoded forms ───────────────────────────────────────

/// One entry as it appears in a document, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub submit_url: Option<String>,
    pub http_realm: Option<String>,
    pub username_field: String,
    pub password_field: String,
}

impl RawEntry {
    /// Hostname for log lines, even when the entry has none.
    pub fn display_host(&self) -> &str {
        match self.hostname.as_deref() {
            Some(h) if !h.is_empty() => h,
            _ => "(no hostname)",
        }
    }
}

/// Result of serializing a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub document: String,
    pub succeeded: usize,
    pub failed: usize,
    /// One hostname per line for every record that could not be written.
    pub failure_log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_versions() {
        assert_eq!(LegacyVersion::parse("1.0.4"), Some(LegacyVersion::V1_0_4));
        assert_eq!(LegacyVersion::parse("2.0"), None);
        assert!(LegacyVersion::V1_0_2.is_pre_1_1());
        assert!(!LegacyVersion::V1_1.is_pre_1_1());
    }

    #[test]
    fn username_obfuscation_rule() {
        let old = DetectedFormat::XmlLegacy { version: LegacyVersion::V1_0_2, encrypt: true };
        let newer = DetectedFormat::XmlLegacy { version: LegacyVersion::V1_0_4, encrypt: true };
        let current = DetectedFormat::CsvCurrentOrLegacy11 { legacy_engine: false, encrypt: true };
        assert!(!old.obfuscates_usernames());
        assert!(newer.obfuscates_usernames());
        assert!(current.obfuscates_usernames());
        assert!(!DetectedFormat::XmlCurrent { encrypt: false }.obfuscates_usernames());
    }

    #[test]
    fn legacy_engine_flag() {
        assert!(DetectedFormat::CsvCurrentOrLegacy11 { legacy_engine: true, encrypt: false }.is_legacy_engine());
        assert!(!DetectedFormat::XmlCurrent { encrypt: true }.is_legacy_engine());
    }

    #[test]
    fn hint_from_extension() {
        assert_eq!(SourceHint::from_path(Path::new("/tmp/a.XML")), SourceHint::Xml);
        assert_eq!(SourceHint::from_path(Path::new("export.csv")), SourceHint::Csv);
        assert_eq!(SourceHint::from_path(Path::new("Login Data")), SourceHint::ThirdPartyStore);
    }

    #[test]
    fn config_defaults_missing_keys() {
        let cfg: InterchangeConfig = serde_json::from_str(r#"{"lineBreak":"crlf"}"#).unwrap();
        assert_eq!(cfg.line_break, LineBreak::CrLf);
        assert_eq!(cfg.default_format, ExportFormat::Xml);
        assert!(cfg.encrypt);
    }
}
