//! Controller-side status reader.
//!
//! A monitor follows one tool run's status file. It keeps the newest record it
//! has displayed and never moves backwards: a missing file, a half-written
//! file or a record older than what is on display leaves the display alone.
//! None of those conditions is an error for the user; they are retried on the
//! next tick.

use super::record::StatusRecord;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Monitor has stopped; nothing was read.
    Inactive,
    /// No run has written the file yet.
    NoFile,
    /// File exists but could not be read this tick.
    Unreadable,
    /// File content did not decode (write in progress or garbage).
    Malformed,
    /// Record is older than the one on display, or predates this run.
    Stale,
    /// Same snapshot as the one on display.
    Unchanged,
    /// New snapshot now on display.
    Updated(StatusRecord),
}

/// Follows one status file.
#[derive(Debug, Clone)]
pub struct StatusMonitor {
    path: PathBuf,
    not_before: Option<DateTime<Utc>>,
    displayed: Option<StatusRecord>,
    active: bool,
}

impl StatusMonitor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            not_before: None,
            displayed: None,
            active: true,
        }
    }

    /// Monitor for a run started at `started_at`; records left over from
    /// earlier runs are treated as stale.
    pub fn since(path: impl Into<PathBuf>, started_at: DateTime<Utc>) -> Self {
        Self {
            not_before: Some(started_at),
            ..Self::new(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The record currently on display.
    pub fn displayed(&self) -> Option<&StatusRecord> {
        self.displayed.as_ref()
    }

    /// Offer a decoded record to the display.
    pub fn observe(&mut self, record: StatusRecord) -> PollOutcome {
        if !self.active {
            return PollOutcome::Inactive;
        }
        self.accept(record)
    }

    fn accept(&mut self, record: StatusRecord) -> PollOutcome {
        if self.not_before.is_some_and(|nb| record.timestamp < nb) {
            return PollOutcome::Stale;
        }
        if let Some(current) = &self.displayed {
            if record.timestamp < current.timestamp {
                return PollOutcome::Stale;
            }
            if *current == record {
                return PollOutcome::Unchanged;
            }
        }

        if record.status.is_terminal() {
            self.active = false;
        }
        self.displayed = Some(record.clone());
        PollOutcome::Updated(record)
    }

    /// Feed the outcome of one file read.
    pub fn ingest(&mut self, read: io::Result<Vec<u8>>) -> PollOutcome {
        if !self.active {
            return PollOutcome::Inactive;
        }
        self.decode(read)
    }

    fn decode(&mut self, read: io::Result<Vec<u8>>) -> PollOutcome {
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return PollOutcome::NoFile,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "status_unreadable");
                return PollOutcome::Unreadable;
            }
        };
        match StatusRecord::from_slice(&bytes) {
            Ok(record) => self.accept(record),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "status_malformed");
                PollOutcome::Malformed
            }
        }
    }

    /// Blocking single read.
    pub fn poll(&mut self) -> PollOutcome {
        if !self.active {
            return PollOutcome::Inactive;
        }
        let read = std::fs::read(&self.path);
        self.decode(read)
    }

    /// Single read on the runtime's blocking pool.
    pub async fn poll_async(&mut self) -> PollOutcome {
        if !self.active {
            return PollOutcome::Inactive;
        }
        let read = tokio::fs::read(&self.path).await;
        self.decode(read)
    }

    /// Last read once the process has ended, then stop.
    pub async fn settle(&mut self) -> PollOutcome {
        let outcome = if self.active {
            let read = tokio::fs::read(&self.path).await;
            self.decode(read)
        } else {
            PollOutcome::Inactive
        };
        self.active = false;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{StatusKind, StatusWriter};
    use chrono::Duration;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    fn at(base: DateTime<Utc>, ms: i64, status: StatusKind, progress: u8) -> StatusRecord {
        StatusRecord::new(status, progress, format!("p{}", progress))
            .with_timestamp(base + Duration::milliseconds(ms))
    }

    #[test]
    fn test_missing_file_is_no_information() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = StatusMonitor::new(dir.path().join("status.json"));
        assert_eq!(monitor.poll(), PollOutcome::NoFile);
        assert!(monitor.displayed().is_none());
        assert!(monitor.is_active());
    }

    #[test]
    fn test_stale_redelivery_keeps_newer_progress() {
        let base = Utc::now();
        let mut monitor = StatusMonitor::new("unused.json");

        let newer = at(base, 10, StatusKind::Running, 40);
        let older = at(base, 0, StatusKind::Running, 10);

        assert_eq!(monitor.observe(newer.clone()), PollOutcome::Updated(newer.clone()));
        assert_eq!(monitor.observe(older), PollOutcome::Stale);
        assert_eq!(monitor.displayed().unwrap().progress, 40);
    }

    #[test]
    fn test_malformed_file_keeps_display() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let writer = StatusWriter::new(&path);
        let mut monitor = StatusMonitor::new(&path);

        let record = writer.update(StatusKind::Running, 25, "Loading model").unwrap();
        assert_eq!(monitor.poll(), PollOutcome::Updated(record.clone()));

        std::fs::write(&path, b"{\"status\": \"runn").unwrap();
        assert_eq!(monitor.poll(), PollOutcome::Malformed);
        assert_eq!(monitor.displayed(), Some(&record));
        assert!(monitor.is_active());
    }

    #[test]
    #[traced_test]
    fn test_garbage_is_logged_not_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, b"not json at all").unwrap();

        let mut monitor = StatusMonitor::new(&path);
        assert_eq!(monitor.poll(), PollOutcome::Malformed);
        assert!(monitor.displayed().is_none());
        assert!(logs_contain("status_malformed"));
    }

    #[test]
    fn test_unchanged_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        StatusWriter::new(&path)
            .update(StatusKind::Running, 5, "Scanning")
            .unwrap();
        let mut monitor = StatusMonitor::new(&path);
        assert!(matches!(monitor.poll(), PollOutcome::Updated(_)));
        assert_eq!(monitor.poll(), PollOutcome::Unchanged);
    }

    #[test]
    fn test_terminal_record_stops_polling() {
        let base = Utc::now();
        let mut monitor = StatusMonitor::new("unused.json");
        monitor.observe(at(base, 0, StatusKind::Running, 50));
        monitor.observe(at(base, 5, StatusKind::Completed, 100));
        assert!(!monitor.is_active());
        assert_eq!(monitor.poll(), PollOutcome::Inactive);
        assert_eq!(monitor.displayed().unwrap().status, StatusKind::Completed);
    }

    #[test]
    fn test_previous_run_record_is_stale() {
        let started = Utc::now();
        let mut monitor = StatusMonitor::since("unused.json", started);
        let leftover = at(started, -60_000, StatusKind::Completed, 100);
        assert_eq!(monitor.observe(leftover), PollOutcome::Stale);
        assert!(monitor.is_active());
        assert!(monitor.displayed().is_none());
    }

    #[tokio::test]
    async fn test_settle_reads_once_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let mut monitor = StatusMonitor::new(&path);
        let record = StatusWriter::new(&path)
            .update(StatusKind::Completed, 100, "Test completed successfully")
            .unwrap();

        assert_eq!(monitor.settle().await, PollOutcome::Updated(record));
        assert!(!monitor.is_active());
        assert_eq!(monitor.poll_async().await, PollOutcome::Inactive);
    }

    proptest! {
        #[test]
        fn prop_display_never_regresses(offsets in proptest::collection::vec(0i64..10_000, 1..20)) {
            let base = Utc::now();
            let mut monitor = StatusMonitor::new("unused.json");
            let mut newest: Option<DateTime<Utc>> = None;

            for (i, ms) in offsets.iter().enumerate() {
                let record = at(base, *ms, StatusKind::Running, (i % 100) as u8);
                let ts = record.timestamp;
                monitor.observe(record);
                newest = Some(newest.map_or(ts, |n| n.max(ts)));
                prop_assert_eq!(monitor.displayed().map(|r| r.timestamp), newest);
            }
        }
    }
}
