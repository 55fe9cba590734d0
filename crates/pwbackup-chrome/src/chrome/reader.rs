//! Reading rows out of a login database that the browser may be holding
//! open. Each attempt opens, queries and closes; failed attempts are retried
//! at a fixed interval.

use async_trait::async_trait;
use log::{debug, warn};
use std::path::Path;

use pwbackup_core::{BackupError, BackupResult};

use super::types::{ChromeImportConfig, LoginRow};

/// Access to a login database file.
#[async_trait]
pub trait LoginDatabase: Send + Sync {
    type Connection: Send;

    /// Open read-only, without taking or honoring locks.
    async fn open(&self, path: &Path) -> BackupResult<Self::Connection>;

    async fn query(&self, conn: &mut Self::Connection, sql: &str) -> BackupResult<Vec<LoginRow>>;

    async fn close(&self, conn: Self::Connection) -> BackupResult<()>;
}

async fn attempt<D: LoginDatabase + ?Sized>(db: &D, path: &Path, sql: &str) -> BackupResult<Vec<LoginRow>> {
    let mut conn = db.open(path).await?;
    let rows = db.query(&mut conn, sql).await;
    if let Err(e) = db.close(conn).await {
        debug!("closing login database failed: {}", e);
    }
    rows
}

/// Fetch every login row, retrying up to `config.max_attempts` times with
/// `config.retry_interval()` between attempts. When every attempt fails the
/// error names the store but not the individual causes.
pub async fn fetch_rows_with_retry<D: LoginDatabase + ?Sized>(
    db: &D,
    path: &Path,
    config: &ChromeImportConfig,
) -> BackupResult<Vec<LoginRow>> {
    let attempts = config.max_attempts.max(1);

    for n in 1..=attempts {
        match attempt(db, path, &config.query).await {
            Ok(rows) => {
                debug!("read {} rows from {} on attempt {}", rows.len(), config.store_description, n);
                return Ok(rows);
            }
            Err(e) => {
                warn!(
                    "attempt {}/{} to read the {} database failed: {}",
                    n, attempts, config.store_description, e
                );
                if n < attempts {
                    tokio::time::sleep(config.retry_interval()).await;
                }
            }
        }
    }

    Err(BackupError::store_unavailable(&config.store_description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwbackup_core::BackupErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails `open` until `succeed_on` opens have been made.
    #[derive(Default)]
    struct FlakyDatabase {
        succeed_on: u32,
        opens: AtomicU32,
        closes: AtomicU32,
    }

    #[async_trait]
    impl LoginDatabase for FlakyDatabase {
        type Connection = ();

        async fn open(&self, _path: &Path) -> BackupResult<()> {
            let n = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
            if self.succeed_on != 0 && n >= self.succeed_on {
                Ok(())
            } else {
                Err(BackupError::new(BackupErrorKind::StoreUnavailable, "database is locked"))
            }
        }

        async fn query(&self, _conn: &mut (), _sql: &str) -> BackupResult<Vec<LoginRow>> {
            Ok(vec![LoginRow { origin_url: "https://a.test/".into(), ..Default::default() }])
        }

        async fn close(&self, _conn: ()) -> BackupResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Opens fine but every query fails.
    #[derive(Default)]
    struct BrokenQuery {
        closes: AtomicU32,
    }

    #[async_trait]
    impl LoginDatabase for BrokenQuery {
        type Connection = ();

        async fn open(&self, _path: &Path) -> BackupResult<()> {
            Ok(())
        }

        async fn query(&self, _conn: &mut (), _sql: &str) -> BackupResult<Vec<LoginRow>> {
            Err(BackupError::new(BackupErrorKind::StoreUnavailable, "no such table: logins"))
        }

        async fn close(&self, _conn: ()) -> BackupResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Err(BackupError::new(BackupErrorKind::StoreUnavailable, "close failed"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_ten_attempts() {
        let db = BrokenQuery::default();
        let started = tokio::time::Instant::now();
        let err = fetch_rows_with_retry(&db, Path::new("Login Data"), &ChromeImportConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, BackupErrorKind::StoreUnavailable);
        assert_eq!(err.message, "Couldn't get rows from the Chrome database.");
        assert_eq!(db.closes.load(Ordering::SeqCst), 10);
        assert_eq!(started.elapsed(), Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_lock_is_released() {
        let db = FlakyDatabase { succeed_on: 4, ..Default::default() };
        let started = tokio::time::Instant::now();
        let rows = fetch_rows_with_retry(&db, Path::new("Login Data"), &ChromeImportConfig::default())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(db.opens.load(Ordering::SeqCst), 4);
        // Failed opens are never closed.
        assert_eq!(db.closes.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_limits_and_description() {
        let db = FlakyDatabase::default();
        let config = ChromeImportConfig {
            store_description: "Chromium".into(),
            max_attempts: 3,
            retry_interval_ms: 50,
            ..Default::default()
        };
        let err = fetch_rows_with_retry(&db, Path::new("x"), &config).await.unwrap_err();
        assert_eq!(err.message, "Couldn't get rows from the Chromium database.");
        assert_eq!(db.opens.load(Ordering::SeqCst), 3);
    }
}
