//! # pwbackup-chrome: Chromium login store migration
//!
//! Reads the `logins` table of a Chromium `Login Data` SQLite file while
//! the browser may still hold it, decrypts each password and maps the row
//! onto a saved login.
//!
//! Architecture:
//! - `types`: rows, scheme tags, import settings and outcome
//! - `reader`: database seam and the fixed-interval retry loop
//! - `sqlite`: sqlx implementation (read-only, immutable open)
//! - `decrypt`: secret decryptor seam, scoped session, Linux `v10` scheme
//! - `importer`: row → login record mapping

pub mod types;
pub mod reader;
pub mod sqlite;
pub mod decrypt;
pub mod importer;

// Re-exports
pub use types::*;
pub use reader::{fetch_rows_with_retry, LoginDatabase};
pub use sqlite::SqliteLoginDatabase;
pub use decrypt::{DecryptSession, LinuxV10Decryptor, SecretDecryptor};
pub use importer::{import_chrome_store, import_rows, map_row, pre_path};
