//! Configuration structures.
//!
//! Controller settings ride along in the registry document under an optional
//! `controller` key; CLI flags override individual fields.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Controller loop configuration.
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Controller loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Status channel poll interval while a tool is running.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Ask before closing while tools are still running.
    pub confirm_close: bool,

    /// Directory (relative to each bundle root) holding status files.
    pub logs_dir: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            confirm_close: true,
            logs_dir: "logs".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_config_humantime() {
        let cfg: ControllerConfig =
            serde_json::from_value(serde_json::json!({"poll_interval": "250ms"})).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert!(cfg.confirm_close);
        assert_eq!(cfg.logs_dir, "logs");
    }

    #[test]
    fn test_controller_config_defaults() {
        let cfg: ControllerConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg, ControllerConfig::default());
    }
}
