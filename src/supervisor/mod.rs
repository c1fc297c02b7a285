//! Process supervision.
//!
//! Owns the handle table: one [`ProcessHandle`] per launched tool, inserted on
//! `launch` and removed when the OS reports the child ended or never started.
//! NOT a separate actor - owned by the controller and called via &mut self,
//! so only the controller loop ever mutates the table.

pub mod spawner;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::{EventSender, LifecycleEvent, SupervisorEvent};
use crate::tools::{self, ToolDescriptor};
use crate::types::{Error, LaunchId, Result, ToolId};

pub use spawner::{ProcessSpawner, SpawnRequest, TokioSpawner};
pub use types::{LaunchState, ProcessHandle};

#[derive(Debug)]
pub struct ProcessSupervisor {
    spawner: Arc<dyn ProcessSpawner>,
    events: EventSender,
    handles: HashMap<ToolId, ProcessHandle>,
}

impl ProcessSupervisor {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, events: EventSender) -> Self {
        Self {
            spawner,
            events,
            handles: HashMap::new(),
        }
    }

    /// Start a tool without waiting for the OS verdict.
    ///
    /// Preconditions are checked in order: enabled, not already running,
    /// environment valid. The spawn outcome arrives later as a
    /// [`SupervisorEvent`] on the channel.
    pub fn launch(&mut self, descriptor: &ToolDescriptor) -> Result<LaunchId> {
        let tool_id = &descriptor.id;

        if !descriptor.enabled {
            return Err(Error::ToolDisabled(tool_id.to_string()));
        }
        if self.handles.contains_key(tool_id) {
            return Err(Error::already_running(tool_id.as_str()));
        }
        // Re-checked on every launch; bundles change between runs.
        tools::validate(descriptor).map_err(|issue| Error::EnvironmentMissing {
            tool_id: tool_id.to_string(),
            issue,
        })?;

        let launch_id = LaunchId::new();
        let handle = ProcessHandle::new(tool_id.clone(), launch_id.clone());
        self.handles.insert(tool_id.clone(), handle);

        tracing::info!(
            tool_id = %tool_id,
            launch_id = %launch_id,
            runtime = %descriptor.runtime_path.display(),
            entry_point = %descriptor.entry_point.display(),
            "tool_launching"
        );

        self.spawner.spawn(
            SpawnRequest {
                tool_id: tool_id.clone(),
                launch_id: launch_id.clone(),
                program: descriptor.runtime_path.clone(),
                args: vec![descriptor.entry_point.clone()],
                working_dir: descriptor.root_path.clone(),
            },
            self.events.clone(),
        );

        Ok(launch_id)
    }

    /// Route one raw observation to its handler.
    pub fn apply(&mut self, event: SupervisorEvent) -> Option<LifecycleEvent> {
        match event {
            SupervisorEvent::Started {
                tool_id,
                launch_id,
                pid,
            } => {
                self.on_started(&tool_id, &launch_id, pid);
                None
            }
            SupervisorEvent::Exited {
                tool_id,
                launch_id,
                exit_code,
            } => self.on_terminated(&tool_id, &launch_id, exit_code),
            SupervisorEvent::LaunchFailed {
                tool_id,
                launch_id,
                reason,
            } => self.on_launch_error(&tool_id, &launch_id, reason),
        }
    }

    /// The OS accepted the spawn: LAUNCHING → RUNNING.
    pub fn on_started(&mut self, tool_id: &ToolId, launch_id: &LaunchId, pid: Option<u32>) {
        let Some(handle) = self.tracked_mut(tool_id, launch_id) else {
            return;
        };
        if !handle.state.can_transition_to(LaunchState::Running) {
            tracing::debug!(tool_id = %tool_id, state = ?handle.state, "start_ignored");
            return;
        }
        handle.state = LaunchState::Running;
        handle.pid = pid;
        tracing::info!(tool_id = %tool_id, launch_id = %launch_id, pid = ?pid, "tool_running");
    }

    /// The child exited, whatever the exit code.
    pub fn on_terminated(
        &mut self,
        tool_id: &ToolId,
        launch_id: &LaunchId,
        exit_code: Option<i32>,
    ) -> Option<LifecycleEvent> {
        let handle = self.release(tool_id, launch_id, LaunchState::Finished)?;
        tracing::info!(
            tool_id = %tool_id,
            launch_id = %launch_id,
            pid = ?handle.pid,
            exit_code = ?exit_code,
            "tool_finished"
        );
        Some(LifecycleEvent::Finished {
            tool_id: tool_id.clone(),
            launch_id: launch_id.clone(),
            exit_code,
        })
    }

    /// The OS could not start the child.
    pub fn on_launch_error(
        &mut self,
        tool_id: &ToolId,
        launch_id: &LaunchId,
        reason: String,
    ) -> Option<LifecycleEvent> {
        self.release(tool_id, launch_id, LaunchState::Error)?;
        tracing::warn!(
            tool_id = %tool_id,
            launch_id = %launch_id,
            reason = %reason,
            "tool_launch_error"
        );
        Some(LifecycleEvent::Error {
            tool_id: tool_id.clone(),
            launch_id: launch_id.clone(),
            reason,
        })
    }

    /// Current state; `Idle` when no handle exists.
    pub fn state(&self, tool_id: &ToolId) -> LaunchState {
        self.handles
            .get(tool_id)
            .map_or(LaunchState::Idle, |h| h.state)
    }

    pub fn handle(&self, tool_id: &ToolId) -> Option<&ProcessHandle> {
        self.handles.get(tool_id)
    }

    pub fn active_count(&self) -> usize {
        self.handles.len()
    }

    /// Ids with a live handle, sorted for stable presentation.
    pub fn active_ids(&self) -> Vec<ToolId> {
        let mut ids: Vec<ToolId> = self.handles.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn tracked_mut(&mut self, tool_id: &ToolId, launch_id: &LaunchId) -> Option<&mut ProcessHandle> {
        match self.handles.get_mut(tool_id) {
            Some(handle) if handle.launch_id == *launch_id => Some(handle),
            Some(_) => {
                tracing::debug!(tool_id = %tool_id, launch_id = %launch_id, "superseded_launch_ignored");
                None
            }
            None => {
                tracing::debug!(tool_id = %tool_id, launch_id = %launch_id, "untracked_launch_ignored");
                None
            }
        }
    }

    /// Move the handle for `launch_id` into a terminal state and drop it;
    /// the tool is IDLE again. Returns the released handle.
    fn release(
        &mut self,
        tool_id: &ToolId,
        launch_id: &LaunchId,
        outcome: LaunchState,
    ) -> Option<ProcessHandle> {
        let handle = self.tracked_mut(tool_id, launch_id)?;
        if !outcome.is_terminal() || !handle.state.can_transition_to(outcome) {
            tracing::debug!(
                tool_id = %tool_id,
                state = ?handle.state,
                outcome = ?outcome,
                "release_ignored"
            );
            return None;
        }
        handle.state = outcome;
        self.handles.remove(tool_id)
    }
}
