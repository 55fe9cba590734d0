//! # pwbackup
//!
//! Backup and restore of saved browser logins.
//!
//! - `pwbackup-core`: login record, error taxonomy, credential store
//!   contract, cancellable insertion cursor
//! - `pwbackup-interchange`: XML / CSV export documents, current and legacy
//! - `pwbackup-chrome`: migration of a Chromium `Login Data` store
//!
//! This crate adds configuration loading, logging setup and file-level
//! orchestration.

pub mod config;
pub mod logging;
pub mod service;

pub use config::BackupConfig;
pub use logging::{init_logging, LoggingConfig};
pub use service::{PasswordBackupService, WrittenExport};

pub use pwbackup_chrome::chrome;
pub use pwbackup_interchange::interchange;
pub use pwbackup_core::{
    BackupError, BackupErrorKind, BackupResult, CancelFlag, CredentialStore, InsertProgress, InsertReport, LoginRecord,
    MemoryCredentialStore, RecordKind,
};
