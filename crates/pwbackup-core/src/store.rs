//! The browser's credential store as seen by import and export.

use log::debug;
use std::collections::BTreeSet;

use crate::error::{BackupError, BackupErrorKind, BackupResult};
use crate::types::LoginRecord;

/// Host-provided access to saved logins and the never-save list.
pub trait CredentialStore {
    fn enumerate_all(&self) -> BackupResult<Vec<LoginRecord>>;

    /// Adds one login. Duplicates and records the store considers invalid
    /// fail with `DuplicateOrInvalid`.
    fn insert(&mut self, record: &LoginRecord) -> BackupResult<()>;

    fn enumerate_disabled_hosts(&self) -> BackupResult<Vec<String>>;

    fn set_saving_enabled(&mut self, hostname: &str, enabled: bool) -> BackupResult<()>;
}

/// Store kept entirely in memory. Used by tests and by callers that stage
/// records before handing them to the real store.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    logins: Vec<LoginRecord>,
    disabled: BTreeSet<String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logins(logins: impl IntoIterator<Item = LoginRecord>) -> Self {
        Self { logins: logins.into_iter().collect(), ..Default::default() }
    }

    pub fn logins(&self) -> &[LoginRecord] {
        &self.logins
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn enumerate_all(&self) -> BackupResult<Vec<LoginRecord>> {
        Ok(self.logins.clone())
    }

    fn insert(&mut self, record: &LoginRecord) -> BackupResult<()> {
        if record.hostname.is_empty() {
            return Err(BackupError::new(BackupErrorKind::DuplicateOrInvalid, "Login has no hostname"));
        }
        if self.logins.iter().any(|l| l.key() == record.key()) {
            return Err(BackupError::duplicate(&record.hostname));
        }
        debug!("stored login for {}", record.hostname);
        self.logins.push(record.clone());
        Ok(())
    }

    fn enumerate_disabled_hosts(&self) -> BackupResult<Vec<String>> {
        Ok(self.disabled.iter().cloned().collect())
    }

    fn set_saving_enabled(&mut self, hostname: &str, enabled: bool) -> BackupResult<()> {
        if enabled {
            self.disabled.remove(hostname);
        } else {
            self.disabled.insert(hostname.to_string());
        }
        Ok(())
    }
}
