//! Canonical record shapes shared by the interchange and migration crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine name written by current exports.
pub const CURRENT_ENGINE: &str = "Password Backup Tool";
/// Engine name found in documents produced by the predecessor tool.
pub const LEGACY_ENGINE: &str = "Password Exporter";
/// Schema version of saved-login documents written today.
pub const CURRENT_LOGIN_VERSION: &str = "2.0";
/// Schema version of disabled-host documents written today.
pub const DISABLED_HOSTS_VERSION: &str = "1.0";

// ── Login record ────────────────────────────────────────────────────

/// A saved credential in the browser's own model.
///
/// `submit_url` and `http_realm` are mutually exclusive once a record has
/// been normalized: an HTTP-auth login carries a realm and no submit URL.
/// `Some("")` in `submit_url` means "any form" and is kept distinct from
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub hostname: String,
    pub username: String,
    pub password: String,
    pub submit_url: Option<String>,
    pub http_realm: Option<String>,
    pub username_field: String,
    pub password_field: String,
}

impl LoginRecord {
    /// Form login for `hostname` submitting to `submit_url`.
    pub fn form(
        hostname: impl Into<String>,
        submit_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            submit_url: Some(submit_url.into()),
            ..Default::default()
        }
    }

    /// HTTP-auth login for `hostname` protected by `realm`.
    pub fn http_auth(
        hostname: impl Into<String>,
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            http_realm: Some(realm.into()),
            ..Default::default()
        }
    }

    pub fn with_fields(mut self, username_field: impl Into<String>, password_field: impl Into<String>) -> Self {
        self.username_field = username_field.into();
        self.password_field = password_field.into();
        self
    }

    pub fn is_http_auth(&self) -> bool {
        self.http_realm.as_deref().map_or(false, |r| !r.is_empty())
    }

    /// Drop the submit URL of HTTP-auth logins and the empty realm of
    /// everything else.
    pub fn enforce_exclusivity(&mut self) {
        if self.is_http_auth() {
            self.submit_url = None;
        } else {
            self.http_realm = None;
        }
    }

    /// Identity used for duplicate detection.
    pub fn key(&self) -> LoginKey<'_> {
        LoginKey {
            hostname: &self.hostname,
            submit_url: self.submit_url.as_deref().unwrap_or(""),
            http_realm: self.http_realm.as_deref().unwrap_or(""),
            username: &self.username,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoginKey<'a> {
    pub hostname: &'a str,
    pub submit_url: &'a str,
    pub http_realm: &'a str,
    pub username: &'a str,
}

// ── Document header ─────────────────────────────────────────────────

/// Whether a document carries saved logins or disabled hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Saved,
    Rejected,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "saved" => Some(Self::Saved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata at the top of every export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportHeader {
    pub engine: String,
    pub version: String,
    pub kind: RecordKind,
    pub encrypt: bool,
}

impl ExportHeader {
    /// Header written by current saved-login exports.
    pub fn current(encrypt: bool) -> Self {
        Self {
            engine: CURRENT_ENGINE.to_string(),
            version: CURRENT_LOGIN_VERSION.to_string(),
            kind: RecordKind::Saved,
            encrypt,
        }
    }

    /// Header written by disabled-host exports.
    pub fn disabled_hosts() -> Self {
        Self {
            engine: CURRENT_ENGINE.to_string(),
            version: DISABLED_HOSTS_VERSION.to_string(),
            kind: RecordKind::Rejected,
            encrypt: false,
        }
    }

    pub fn is_legacy_engine(&self) -> bool {
        self.engine == LEGACY_ENGINE
    }
}
