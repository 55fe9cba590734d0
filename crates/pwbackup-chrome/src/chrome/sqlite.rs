//! SQLite-backed [`LoginDatabase`].

use async_trait::async_trait;
use log::debug;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

use pwbackup_core::{BackupError, BackupErrorKind, BackupResult};

use super::reader::LoginDatabase;
use super::types::LoginRow;

/// Opens the browser's `Login Data` file read-only and immutable, so a
/// running browser's lock does not block the read.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLoginDatabase;

impl SqliteLoginDatabase {
    pub fn new() -> Self {
        Self
    }
}

fn store_error(context: &str, e: sqlx::Error) -> BackupError {
    BackupError::new(BackupErrorKind::StoreUnavailable, format!("{context}: {e}"))
}

fn text(row: &SqliteRow, column: &str) -> BackupResult<String> {
    let value: Option<String> = row.try_get(column).map_err(|e| store_error(column, e))?;
    Ok(value.unwrap_or_default())
}

fn integer(row: &SqliteRow, column: &str) -> BackupResult<i64> {
    let value: Option<i64> = row.try_get(column).map_err(|e| store_error(column, e))?;
    Ok(value.unwrap_or_default())
}

fn map_row(row: &SqliteRow) -> BackupResult<LoginRow> {
    let password_value: Option<Vec<u8>> = row
        .try_get("password_value")
        .map_err(|e| store_error("password_value", e))?;
    Ok(LoginRow {
        origin_url: text(row, "origin_url")?,
        action_url: text(row, "action_url")?,
        username_element: text(row, "username_element")?,
        username_value: text(row, "username_value")?,
        password_element: text(row, "password_element")?,
        password_value: password_value.unwrap_or_default(),
        signon_realm: text(row, "signon_realm")?,
        scheme: integer(row, "scheme")?,
        date_created: integer(row, "date_created")?,
        times_used: integer(row, "times_used")?,
    })
}

#[async_trait]
impl LoginDatabase for SqliteLoginDatabase {
    type Connection = SqlitePool;

    async fn open(&self, path: &Path) -> BackupResult<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .immutable(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| store_error("SQLite open", e))?;
        debug!("opened login database {}", path.display());
        Ok(pool)
    }

    async fn query(&self, pool: &mut SqlitePool, sql: &str) -> BackupResult<Vec<LoginRow>> {
        let rows: Vec<SqliteRow> = sqlx::query(sql)
            .fetch_all(&*pool)
            .await
            .map_err(|e| store_error("SQLite query", e))?;
        rows.iter().map(map_row).collect()
    }

    async fn close(&self, pool: SqlitePool) -> BackupResult<()> {
        pool.close().await;
        Ok(())
    }
}
