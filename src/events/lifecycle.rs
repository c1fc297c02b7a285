//! Supervisor observations and lifecycle events.
//!
//! Two layers:
//!   [`SupervisorEvent`]: raw observations from the OS process layer
//!     (started, exited, failed to start), produced by watcher tasks.
//!   [`LifecycleEvent`]: what the supervisor reports after applying an
//!     observation to its table: `Finished` or `Error`. Observations for a
//!     launch that is no longer tracked produce nothing.

use crate::types::{LaunchId, ToolId};
use serde::Serialize;
use tokio::sync::mpsc;

/// Raw observation about one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The OS accepted the spawn.
    Started {
        tool_id: ToolId,
        launch_id: LaunchId,
        pid: Option<u32>,
    },
    /// The child exited, whatever its exit code.
    Exited {
        tool_id: ToolId,
        launch_id: LaunchId,
        exit_code: Option<i32>,
    },
    /// The OS could not start the child.
    LaunchFailed {
        tool_id: ToolId,
        launch_id: LaunchId,
        reason: String,
    },
}

/// Sender half handed to spawners.
pub type EventSender = mpsc::UnboundedSender<SupervisorEvent>;
/// Receiver half drained by the controller loop.
pub type EventReceiver = mpsc::UnboundedReceiver<SupervisorEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Terminal outcome of one launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Ran to completion in any form; exit codes are not interpreted.
    Finished {
        tool_id: ToolId,
        launch_id: LaunchId,
        exit_code: Option<i32>,
    },
    /// Failed to start.
    Error {
        tool_id: ToolId,
        launch_id: LaunchId,
        reason: String,
    },
}

impl LifecycleEvent {
    pub fn tool_id(&self) -> &ToolId {
        match self {
            LifecycleEvent::Finished { tool_id, .. } | LifecycleEvent::Error { tool_id, .. } => {
                tool_id
            }
        }
    }

    pub fn launch_id(&self) -> &LaunchId {
        match self {
            LifecycleEvent::Finished { launch_id, .. }
            | LifecycleEvent::Error { launch_id, .. } => launch_id,
        }
    }

    /// Event name used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::Finished { .. } => "tool.finished",
            LifecycleEvent::Error { .. } => "tool.error",
        }
    }
}

/// Single dispatch point for lifecycle events.
pub trait LifecycleSink {
    fn on_lifecycle(&mut self, event: &LifecycleEvent);
}
