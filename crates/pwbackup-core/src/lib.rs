//! # pwbackup – Core
//!
//! Canonical login record, shared error taxonomy, the credential store
//! contract and the cancellable insertion cursor used by every import path.

pub mod error;
pub mod insert;
pub mod store;
pub mod types;

pub use error::{BackupError, BackupErrorKind, BackupResult};
pub use insert::{CancelFlag, InsertCursor, InsertFailure, InsertProgress, InsertReport};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::*;
