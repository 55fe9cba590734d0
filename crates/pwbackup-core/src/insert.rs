//! Step-wise insertion of imported records into a credential store.
//!
//! The host drives an [`InsertCursor`] one record at a time so it can
//! repaint progress between steps, and can stop the run from elsewhere via
//! a shared [`CancelFlag`]. Records already inserted stay inserted.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::BackupError;
use crate::store::CredentialStore;
use crate::types::LoginRecord;

/// Cancellation signal shared between the caller and a running import.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertProgress {
    /// 1-based index of the record just processed.
    pub current: usize,
    pub total: usize,
    /// Whole percent, rounded down.
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertFailure {
    pub hostname: String,
    pub error: BackupError,
}

impl InsertFailure {
    pub fn new(hostname: impl Into<String>, error: BackupError) -> Self {
        Self { hostname: hostname.into(), error }
    }

    /// `hostname (message)`, the line written to the failure log.
    pub fn log_line(&self) -> String {
        format!("{} ({})", self.hostname, self.error.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertReport {
    pub total: usize,
    pub inserted: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub failures: Vec<InsertFailure>,
}

impl InsertReport {
    pub fn failure_log(&self, line_break: &str) -> String {
        self.failures
            .iter()
            .map(|f| f.log_line() + line_break)
            .collect()
    }

    fn record_failure(&mut self, failure: InsertFailure) {
        warn!("{}", failure.log_line());
        self.failed += 1;
        self.failures.push(failure);
    }
}

pub struct InsertCursor {
    pending: std::vec::IntoIter<LoginRecord>,
    total: usize,
    position: usize,
    cancel: CancelFlag,
    report: InsertReport,
}

impl InsertCursor {
    pub fn new(records: Vec<LoginRecord>, cancel: CancelFlag) -> Self {
        let total = records.len();
        Self {
            pending: records.into_iter(),
            total,
            position: 0,
            cancel,
            report: InsertReport { total, ..Default::default() },
        }
    }

    /// Entries that were rejected before reaching the store still count
    /// toward the final report.
    pub fn with_prior_failures(mut self, failures: Vec<InsertFailure>) -> Self {
        self.report.total += failures.len();
        for failure in failures {
            self.report.record_failure(failure);
        }
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.report.cancelled || self.position >= self.total
    }

    /// Insert the next record. Returns `None` once every record has been
    /// processed or the cancel flag was raised.
    pub fn step<S: CredentialStore + ?Sized>(&mut self, store: &mut S) -> Option<InsertProgress> {
        if self.cancel.is_cancelled() {
            if !self.report.cancelled && self.position < self.total {
                info!("import cancelled after {} of {} logins", self.position, self.total);
            }
            self.report.cancelled = self.position < self.total;
            return None;
        }

        let mut record = self.pending.next()?;
        self.position += 1;
        record.enforce_exclusivity();

        match store.insert(&record) {
            Ok(()) => self.report.inserted += 1,
            Err(e) => self.report.record_failure(InsertFailure::new(record.hostname, e)),
        }

        Some(InsertProgress {
            current: self.position,
            total: self.total,
            percentage: (self.position * 100 / self.total) as u8,
        })
    }

    /// Drive the cursor to completion, reporting progress after each record.
    pub fn run<S, F>(mut self, store: &mut S, mut on_progress: F) -> InsertReport
    where
        S: CredentialStore + ?Sized,
        F: FnMut(&InsertProgress),
    {
        while let Some(progress) = self.step(store) {
            on_progress(&progress);
        }
        self.finish()
    }

    pub fn finish(self) -> InsertReport {
        info!(
            "import finished: {} inserted, {} failed{}",
            self.report.inserted,
            self.report.failed,
            if self.report.cancelled { " (cancelled)" } else { "" }
        );
        self.report
    }
}
