//! Error taxonomy shared by every pwbackup crate.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupErrorKind {
    /// Document does not parse or has no recognisable header.
    MalformedDocument,
    /// Header names an engine this tool does not read.
    UnsupportedEngine,
    /// Engine is known but the schema version is not.
    UnsupportedVersion,
    /// Saved-login document given to the disabled-host flow or vice versa.
    WrongFileKind,
    /// Credential store refused a record.
    DuplicateOrInvalid,
    /// Raw entry could not be turned into a login record.
    InvalidEntry,
    /// Login record could not be represented in the target dialect.
    EncodeFailed,
    /// Third-party row uses an authentication scheme with no mapping.
    UnsupportedAuthScheme,
    DecryptionFailed,
    /// Third-party database stayed unreadable after every retry.
    StoreUnavailable,
    Io,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupError {
    pub kind: BackupErrorKind,
    pub message: String,
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for BackupError {}

pub type BackupResult<T> = Result<T, BackupError>;

impl BackupError {
    pub fn new(kind: BackupErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackupErrorKind::MalformedDocument, message)
    }

    pub fn unsupported_engine(engine: &str) -> Self {
        Self::new(BackupErrorKind::UnsupportedEngine, format!("Unsupported export engine: {engine}"))
    }

    pub fn unsupported_version(engine: &str, version: &str) -> Self {
        Self::new(
            BackupErrorKind::UnsupportedVersion,
            format!("Unsupported {engine} export version: {version}"),
        )
    }

    pub fn wrong_kind(expected: &str, found: &str) -> Self {
        Self::new(
            BackupErrorKind::WrongFileKind,
            format!("Expected a {expected} file but found {found}"),
        )
    }

    pub fn duplicate(hostname: &str) -> Self {
        Self::new(BackupErrorKind::DuplicateOrInvalid, format!("Login already exists for {hostname}"))
    }

    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::new(BackupErrorKind::InvalidEntry, message)
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(BackupErrorKind::EncodeFailed, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(BackupErrorKind::Config, message)
    }

    pub fn store_unavailable(description: &str) -> Self {
        Self::new(
            BackupErrorKind::StoreUnavailable,
            format!("Couldn't get rows from the {description} database."),
        )
    }

    /// Errors found while validating a document, before any record is
    /// touched.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self.kind,
            BackupErrorKind::MalformedDocument
                | BackupErrorKind::UnsupportedEngine
                | BackupErrorKind::UnsupportedVersion
                | BackupErrorKind::WrongFileKind
        )
    }

    /// Errors that end the whole operation: bad documents, plus an
    /// unreadable login database, file system or configuration.
    pub fn is_fatal(&self) -> bool {
        self.is_document_level()
            || matches!(
                self.kind,
                BackupErrorKind::StoreUnavailable | BackupErrorKind::Io | BackupErrorKind::Config
            )
    }

    /// Errors that are counted and logged per record while the batch goes on.
    pub fn is_record_level(&self) -> bool {
        !self.is_fatal()
    }
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        Self::new(BackupErrorKind::Io, e.to_string())
    }
}

impl From<BackupError> for String {
    fn from(e: BackupError) -> Self {
        e.to_string()
    }
}
