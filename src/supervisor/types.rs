//! Supervisor types: LaunchState, ProcessHandle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LaunchId, ToolId};

/// Per-tool launch state.
///
/// State transitions:
/// ```text
/// IDLE → LAUNCHING → RUNNING → {FINISHED | ERROR} → IDLE
///            ↓                        ↑
///            └──────── ERROR ─────────┘
/// ```
/// `Finished` and `Error` are reported through lifecycle events; the table
/// itself only ever holds `Launching` or `Running` handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LaunchState {
    Idle,
    Launching,
    Running,
    Finished,
    Error,
}

impl LaunchState {
    /// Check if this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, LaunchState::Finished | LaunchState::Error)
    }

    /// A handle exists in this state.
    pub fn is_active(self) -> bool {
        matches!(self, LaunchState::Launching | LaunchState::Running)
    }

    /// Check if transition is valid.
    pub fn can_transition_to(self, to: LaunchState) -> bool {
        match (self, to) {
            (LaunchState::Idle, LaunchState::Launching) => true,
            // LAUNCHING
            (LaunchState::Launching, LaunchState::Running) => true,
            (LaunchState::Launching, LaunchState::Error) => true,
            // Exit observed before the start notification was applied
            (LaunchState::Launching, LaunchState::Finished) => true,
            // RUNNING
            (LaunchState::Running, LaunchState::Finished) => true,
            (LaunchState::Running, LaunchState::Error) => true,
            // Terminal states release the handle
            (LaunchState::Finished, LaunchState::Idle) => true,
            (LaunchState::Error, LaunchState::Idle) => true,
            _ => false,
        }
    }
}

/// Live supervision record; one per in-flight launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessHandle {
    pub tool_id: ToolId,
    pub launch_id: LaunchId,
    /// OS process id once the spawn has been confirmed.
    pub pid: Option<u32>,
    pub state: LaunchState,
    pub start_time: DateTime<Utc>,
}

impl ProcessHandle {
    pub fn new(tool_id: ToolId, launch_id: LaunchId) -> Self {
        Self {
            tool_id,
            launch_id,
            pid: None,
            state: LaunchState::Launching,
            start_time: Utc::now(),
        }
    }
}
