//! Status record: the unit exchanged over a tool's status file.
//!
//! Every record is a complete snapshot:
//! ```json
//! {"status": "running", "progress": 40, "message": "Processing", "timestamp": "2025-01-12T10:15:02.123456"}
//! ```
//! Timestamps are accepted as RFC 3339 or as offset-less ISO-8601 local time,
//! which is what script engines emit.

use crate::validation::validate_at_most;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Engine-reported state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ready,
    Running,
    #[serde(alias = "complete")]
    Completed,
    Error,
    Stopped,
}

impl StatusKind {
    /// Readers stop polling after a terminal record.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StatusKind::Completed | StatusKind::Error | StatusKind::Stopped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Ready => "ready",
            StatusKind::Running => "running",
            StatusKind::Completed => "completed",
            StatusKind::Error => "error",
            StatusKind::Stopped => "stopped",
        }
    }
}

/// One complete status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStatusRecord")]
pub struct StatusRecord {
    pub status: StatusKind,
    /// 0–100.
    pub progress: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(status: StatusKind, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Decode a status file's contents.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// One-line rendering for progress displays.
    pub fn display_line(&self) -> String {
        format!(
            "[{:>3}%] {}: {}",
            self.progress,
            self.status.as_str(),
            self.message
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawStatusRecord {
    status: StatusKind,
    #[serde(default)]
    progress: i64,
    #[serde(default)]
    message: String,
    timestamp: String,
}

impl TryFrom<RawStatusRecord> for StatusRecord {
    type Error = String;

    fn try_from(raw: RawStatusRecord) -> Result<Self, Self::Error> {
        validate_at_most(raw.progress, 100, "progress").map_err(|e| match e {
            crate::types::Error::ConfigMalformed(msg) => msg,
            other => other.to_string(),
        })?;
        let timestamp = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| format!("unrecognised timestamp '{}'", raw.timestamp))?;
        Ok(Self {
            status: raw.status,
            progress: raw.progress as u8,
            message: raw.message,
            timestamp,
        })
    }
}

/// Parse an RFC 3339 timestamp, or an offset-less one interpreted as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
