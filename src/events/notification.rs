//! User-visible notifications.
//!
//! Pure deterministic mapping from errors and lifecycle failures to the short
//! title/body pairs a presenter shows without blocking the loop.

use crate::types::{Error, Severity};
use serde::Serialize;

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            body: body.into(),
        }
    }

    /// A launched tool could not be started.
    pub fn tool_error(display_name: &str) -> Self {
        Self::new(
            Severity::Error,
            "Tool Error",
            format!("{} encountered an error.", display_name),
        )
    }
}

impl From<&Error> for Notification {
    fn from(err: &Error) -> Self {
        let severity = err.severity();
        match err {
            Error::ConfigNotFound { path } => Notification::new(
                severity,
                "Config Error",
                format!("{} not found!", path.display()),
            ),
            Error::ConfigMalformed(msg) => {
                Notification::new(severity, "Config Error", msg.clone())
            }
            Error::ToolNotRegistered(id) => Notification::new(
                severity,
                "Tool Not Found",
                format!("Tool '{}' not registered.", id),
            ),
            Error::ToolDisabled(id) => Notification::new(
                severity,
                "Tool Disabled",
                format!("Tool '{}' is disabled.", id),
            ),
            Error::EnvironmentMissing { tool_id, issue } => Notification::new(
                severity,
                "Environment Missing",
                format!(
                    "Environment not ready for {}: {}.\nExpected: {}",
                    tool_id,
                    issue,
                    issue.path().display()
                ),
            ),
            Error::AlreadyRunning(id) => Notification::new(
                severity,
                "Tool Running",
                format!("Tool '{}' is already running.", id),
            ),
            Error::SpawnFailed { tool_id, message } => Notification::new(
                severity,
                "Tool Error",
                format!("{} could not be started: {}", tool_id, message),
            ),
            other => Notification::new(severity, "Error", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::EnvironmentIssue;
    use std::path::PathBuf;

    #[test]
    fn test_not_registered() {
        let n = Notification::from(&Error::not_registered("ghost"));
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(n.title, "Tool Not Found");
        assert_eq!(n.body, "Tool 'ghost' not registered.");
    }

    #[test]
    fn test_environment_missing_names_path() {
        let err = Error::EnvironmentMissing {
            tool_id: "fake_tool".into(),
            issue: EnvironmentIssue::RuntimeMissing {
                path: PathBuf::from("/tools/FakeTool/.venv/bin/python"),
            },
        };
        let n = Notification::from(&err);
        assert_eq!(n.title, "Environment Missing");
        assert!(n.body.contains("Expected: /tools/FakeTool/.venv/bin/python"));
    }

    #[test]
    fn test_tool_error() {
        let n = Notification::tool_error("Vision Tester");
        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.body, "Vision Tester encountered an error.");
    }

    #[test]
    fn test_fatal_config() {
        let n = Notification::from(&Error::ConfigNotFound {
            path: PathBuf::from("studio_config.json"),
        });
        assert_eq!(n.severity, Severity::Fatal);
        assert_eq!(n.body, "studio_config.json not found!");
    }
}
