//! Rows, schemes and settings for the Chromium login database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use pwbackup_core::{BackupError, BackupErrorKind, BackupResult, CancelFlag, InsertCursor, InsertFailure, LoginRecord};

/// Every login the user did not mark as "never save".
pub const LOGINS_QUERY: &str = "SELECT origin_url, action_url, username_element, username_value, \
password_element, password_value, signon_realm, scheme, date_created, times_used \
FROM logins WHERE blacklisted_by_user = 0";

/// Seconds between 1601-01-01 and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    HtmlForm,
    Basic,
    Digest,
}

impl AuthScheme {
    pub fn from_tag(tag: i64) -> BackupResult<Self> {
        match tag {
            0 => Ok(Self::HtmlForm),
            1 => Ok(Self::Basic),
            2 => Ok(Self::Digest),
            other => Err(BackupError::new(
                BackupErrorKind::UnsupportedAuthScheme,
                format!("Login data scheme type not supported: {other}"),
            )),
        }
    }
}

/// One row of the `logins` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginRow {
    pub origin_url: String,
    pub action_url: String,
    pub username_element: String,
    pub username_value: String,
    pub password_element: String,
    /// Encrypted by the operating system's secret service.
    pub password_value: Vec<u8>,
    pub signon_realm: String,
    pub scheme: i64,
    /// Microseconds since 1601-01-01 UTC.
    pub date_created: i64,
    pub times_used: i64,
}

impl LoginRow {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.date_created <= 0 {
            return None;
        }
        let secs = self.date_created.div_euclid(1_000_000) - WEBKIT_EPOCH_OFFSET_SECS;
        let nanos = (self.date_created.rem_euclid(1_000_000) * 1_000) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChromeImportConfig {
    /// Name used in log lines and the final "couldn't get rows" error.
    pub store_description: String,
    pub max_attempts: u32,
    pub retry_interval_ms: u64,
    pub query: String,
}

impl Default for ChromeImportConfig {
    fn default() -> Self {
        Self {
            store_description: "Chrome".to_string(),
            max_attempts: 10,
            retry_interval_ms: 100,
            query: LOGINS_QUERY.to_string(),
        }
    }
}

impl ChromeImportConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Logins mapped from a batch of rows, plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ChromeImportOutcome {
    pub records: Vec<LoginRecord>,
    pub failures: Vec<InsertFailure>,
}

impl ChromeImportOutcome {
    pub fn into_cursor(self, cancel: CancelFlag) -> InsertCursor {
        InsertCursor::new(self.records, cancel).with_prior_failures(self.failures)
    }
}
