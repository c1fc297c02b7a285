//! Engine-side status writer.
//!
//! Each update replaces the whole file: the record goes to a sibling temp file
//! which is then renamed over the target, so readers see either the previous
//! snapshot or the new one.

use super::record::{StatusKind, StatusRecord};
use crate::types::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes status records for one tool run.
#[derive(Debug, Clone)]
pub struct StatusWriter {
    path: PathBuf,
}

impl StatusWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp a record with the current time and write it.
    pub fn update(
        &self,
        status: StatusKind,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<StatusRecord> {
        let record = StatusRecord::new(status, progress, message);
        self.write(&record)?;
        Ok(record)
    }

    /// Replace the status file with `record`.
    pub fn write(&self, record: &StatusRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded = serde_json::to_vec_pretty(record)?;
        atomic_write_file(&self.path, &encoded)?;
        tracing::debug!(
            path = %self.path.display(),
            status = record.status.as_str(),
            progress = record.progress,
            "status_written"
        );
        Ok(())
    }
}

fn atomic_write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp_name = format!(
        ".{}.tmp-{}-{}",
        path.file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("status"),
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    let tmp_path = parent.join(tmp_name);

    let written = (|| {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}
