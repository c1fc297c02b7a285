//! Process spawning seam.
//!
//! The supervisor never touches the OS directly: it hands a [`SpawnRequest`]
//! to a [`ProcessSpawner`], which reports back through the event channel.
//! Tests inject a spawner that records requests instead of starting anything.

use crate::events::{EventSender, SupervisorEvent};
use crate::types::{LaunchId, ToolId};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

/// Everything needed to start one tool process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub tool_id: ToolId,
    pub launch_id: LaunchId,
    pub program: PathBuf,
    pub args: Vec<PathBuf>,
    pub working_dir: PathBuf,
}

/// Starts child processes and reports their fate.
///
/// `spawn` must return without waiting for the child. Exactly one of
/// `LaunchFailed` or `Started` (later followed by `Exited`) is sent per request.
pub trait ProcessSpawner: Send + Sync + fmt::Debug {
    fn spawn(&self, request: SpawnRequest, events: EventSender);
}

/// Real spawner on `tokio::process`. Must be called inside a runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, request: SpawnRequest, events: EventSender) {
        let SpawnRequest {
            tool_id,
            launch_id,
            program,
            args,
            working_dir,
        } = request;

        let mut command = tokio::process::Command::new(&program);
        command
            .args(&args)
            .current_dir(&working_dir)
            .stdin(Stdio::null());
        // Own process group: a terminal Ctrl-C reaches the controller only,
        // which then asks before closing.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    tool_id = %tool_id,
                    launch_id = %launch_id,
                    program = %program.display(),
                    error = %e,
                    "spawn_failed"
                );
                let _ = events.send(SupervisorEvent::LaunchFailed {
                    tool_id,
                    launch_id,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let pid = child.id();
        let _ = events.send(SupervisorEvent::Started {
            tool_id: tool_id.clone(),
            launch_id: launch_id.clone(),
            pid,
        });

        tokio::spawn(async move {
            let exit_code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!(tool_id = %tool_id, error = %e, "child_wait_failed");
                    None
                }
            };
            // Receiver gone means the controller has shut down.
            let _ = events.send(SupervisorEvent::Exited {
                tool_id,
                launch_id,
                exit_code,
            });
        });
    }
}
