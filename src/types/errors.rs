//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use std::path::PathBuf;
use thiserror::Error;

use crate::tools::EnvironmentIssue;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// How an error is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// Main error enum for the controller.
#[derive(Error, Debug)]
pub enum Error {
    /// Registry document is absent (fatal).
    #[error("registry not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Registry document is structurally invalid (fatal).
    #[error("registry malformed: {0}")]
    ConfigMalformed(String),

    /// Lookup miss.
    #[error("tool '{0}' not registered")]
    ToolNotRegistered(String),

    /// Tool exists but is disabled in the registry.
    #[error("tool '{0}' is disabled")]
    ToolDisabled(String),

    /// Runtime or entry point missing for a bundle.
    #[error("environment missing for '{tool_id}': {issue}")]
    EnvironmentMissing {
        tool_id: String,
        issue: EnvironmentIssue,
    },

    /// A handle already exists for this tool.
    #[error("tool '{0}' is already running")]
    AlreadyRunning(String),

    /// The OS could not start the process.
    #[error("failed to start '{tool_id}': {message}")]
    SpawnFailed { tool_id: String, message: String },

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Registry errors abort startup; everything else is caught at its boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigNotFound { .. } | Error::ConfigMalformed(_))
    }

    /// Presentation severity for the user-visible notification.
    pub fn severity(&self) -> Severity {
        match self {
            Error::ConfigNotFound { .. } | Error::ConfigMalformed(_) => Severity::Fatal,
            Error::ToolNotRegistered(_)
            | Error::ToolDisabled(_)
            | Error::EnvironmentMissing { .. }
            | Error::AlreadyRunning(_) => Severity::Warning,
            Error::SpawnFailed { .. }
            | Error::Internal(_)
            | Error::Serialization(_)
            | Error::Io(_) => Severity::Error,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn config_malformed(msg: impl Into<String>) -> Self {
        Self::ConfigMalformed(msg.into())
    }

    pub fn not_registered(tool_id: impl Into<String>) -> Self {
        Self::ToolNotRegistered(tool_id.into())
    }

    pub fn already_running(tool_id: impl Into<String>) -> Self {
        Self::AlreadyRunning(tool_id.into())
    }

    pub fn spawn_failed(tool_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            tool_id: tool_id.into(),
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_registry_errors_are_fatal() {
        assert!(Error::ConfigNotFound {
            path: PathBuf::from("studio_config.json")
        }
        .is_fatal());
        assert!(Error::config_malformed("duplicate id").is_fatal());

        assert!(!Error::not_registered("x").is_fatal());
        assert!(!Error::already_running("x").is_fatal());
        assert!(!Error::spawn_failed("x", "denied").is_fatal());
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(Error::not_registered("x").severity(), Severity::Warning);
        assert_eq!(
            Error::EnvironmentMissing {
                tool_id: "x".into(),
                issue: EnvironmentIssue::RuntimeMissing {
                    path: PathBuf::from("/nope")
                },
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(Error::spawn_failed("x", "denied").severity(), Severity::Error);
        assert_eq!(Error::config_malformed("bad").severity(), Severity::Fatal);
    }

    #[test]
    fn test_messages_name_the_tool() {
        let err = Error::not_registered("vision_tester");
        assert_eq!(err.to_string(), "tool 'vision_tester' not registered");
    }
}
