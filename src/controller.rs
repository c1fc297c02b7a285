//! Controller - the single owner of the event loop.
//!
//! Wires registry → validator → supervisor → status monitors → visibility.
//! Every mutation of the handle table happens here, one event at a time:
//! supervisor observations, poll ticks, and close requests are multiplexed
//! by [`Controller::run`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::events::{
    event_channel, EventReceiver, LifecycleEvent, LifecycleSink, Notification, SupervisorEvent,
};
use crate::status::{PollOutcome, StatusMonitor, StatusRecord};
use crate::supervisor::{LaunchState, ProcessSpawner, ProcessSupervisor};
use crate::tools::ToolRegistry;
use crate::types::{Error, LaunchId, Result, ToolId};
use crate::visibility::{Presenter, VisibilityCoordinator};

/// Why [`Controller::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No launched tool is active any more.
    Idle,
    /// A close request was granted.
    Closed,
}

/// What woke the loop.
enum Wake {
    Supervisor(Option<SupervisorEvent>),
    Tick,
    Close(Option<()>),
}

#[derive(Debug)]
pub struct Controller<P> {
    registry: ToolRegistry,
    poll_interval: Duration,
    supervisor: ProcessSupervisor,
    visibility: VisibilityCoordinator<P>,
    monitors: HashMap<ToolId, StatusMonitor>,
    events: EventReceiver,
}

impl<P: Presenter> Controller<P> {
    pub fn new(registry: ToolRegistry, spawner: Arc<dyn ProcessSpawner>, presenter: P) -> Self {
        let (tx, rx) = event_channel();
        let settings = registry.config().controller.clone();
        Self {
            poll_interval: settings.poll_interval,
            supervisor: ProcessSupervisor::new(spawner, tx),
            visibility: VisibilityCoordinator::new(presenter, settings.confirm_close),
            monitors: HashMap::new(),
            events: rx,
            registry,
        }
    }

    /// Override the configured status poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &P {
        self.visibility.presenter()
    }

    /// Launch a registered tool by id.
    ///
    /// Every failure is also shown to the user as a notification; the
    /// controller stays usable afterwards.
    pub fn launch(&mut self, tool_id: &str) -> Result<LaunchId> {
        let result = self.try_launch(tool_id);
        if let Err(e) = &result {
            tracing::warn!(tool_id = %tool_id, error = %e, "launch_rejected");
            self.visibility
                .presenter_mut()
                .notify(&Notification::from(e));
        }
        result
    }

    fn try_launch(&mut self, tool_id: &str) -> Result<LaunchId> {
        let descriptor = self
            .registry
            .lookup(tool_id)
            .ok_or_else(|| Error::not_registered(tool_id))?;

        let launch_id = self.supervisor.launch(descriptor)?;
        let started_at = self
            .supervisor
            .handle(&descriptor.id)
            .map_or_else(Utc::now, |h| h.start_time);

        self.monitors.insert(
            descriptor.id.clone(),
            StatusMonitor::since(descriptor.status_path.clone(), started_at),
        );
        self.visibility.on_launched(&descriptor.id);
        Ok(launch_id)
    }

    /// Apply one supervisor observation.
    pub async fn handle_event(&mut self, event: SupervisorEvent) {
        let Some(lifecycle) = self.supervisor.apply(event) else {
            return;
        };
        let tool_id = lifecycle.tool_id().clone();

        // One last read so a record written just before exit is not lost.
        if let Some(monitor) = self.monitors.get_mut(&tool_id) {
            if let PollOutcome::Updated(record) = monitor.settle().await {
                self.visibility
                    .presenter_mut()
                    .show_progress(&tool_id, &record);
            }
        }

        if let LifecycleEvent::Error { reason, .. } = &lifecycle {
            let display_name = self
                .registry
                .lookup(tool_id.as_str())
                .map_or(tool_id.as_str(), |d| d.display_name.as_str());
            let err = Error::spawn_failed(tool_id.as_str(), reason.as_str());
            tracing::warn!(
                tool_id = %tool_id,
                launch_id = %lifecycle.launch_id(),
                error = %err,
                "tool_error"
            );
            self.visibility
                .presenter_mut()
                .notify(&Notification::tool_error(display_name));
        }

        self.visibility.on_lifecycle(&lifecycle);
    }

    /// One status read per running tool; returns how many displays changed.
    pub async fn poll_status(&mut self) -> usize {
        let mut updated = 0;
        for (tool_id, monitor) in self.monitors.iter_mut() {
            if self.supervisor.state(tool_id) != LaunchState::Running {
                continue;
            }
            if let PollOutcome::Updated(record) = monitor.poll_async().await {
                tracing::debug!(
                    tool_id = %tool_id,
                    status = record.status.as_str(),
                    progress = record.progress,
                    "status_updated"
                );
                self.visibility
                    .presenter_mut()
                    .show_progress(tool_id, &record);
                updated += 1;
            }
        }
        updated
    }

    /// Whether the controller may close now; asks the user when tools
    /// are still running. Running children are left alone either way.
    pub fn request_close(&mut self) -> bool {
        let active = self.supervisor.active_ids();
        self.visibility.request_close(&active)
    }

    /// Drive the loop until no launched tool is active or a close request
    /// is granted.
    pub async fn run(&mut self, mut close_requests: mpsc::Receiver<()>) -> RunOutcome {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut closes_open = true;

        loop {
            if self.supervisor.active_count() == 0 {
                return RunOutcome::Idle;
            }

            let wake = tokio::select! {
                event = self.events.recv() => Wake::Supervisor(event),
                _ = ticker.tick() => Wake::Tick,
                request = close_requests.recv(), if closes_open => Wake::Close(request),
            };

            match wake {
                Wake::Supervisor(Some(event)) => self.handle_event(event).await,
                // The supervisor holds a sender, so this only happens on teardown.
                Wake::Supervisor(None) => return RunOutcome::Idle,
                Wake::Tick => {
                    self.poll_status().await;
                }
                Wake::Close(Some(())) => {
                    if self.request_close() {
                        tracing::info!(
                            running = self.supervisor.active_count(),
                            "controller_closing"
                        );
                        return RunOutcome::Closed;
                    }
                }
                Wake::Close(None) => closes_open = false,
            }
        }
    }

    /// Last record shown for a tool, from the current or latest run.
    pub fn status_of(&self, tool_id: &ToolId) -> Option<&StatusRecord> {
        self.monitors.get(tool_id).and_then(|m| m.displayed())
    }

    pub fn launch_state(&self, tool_id: &ToolId) -> LaunchState {
        self.supervisor.state(tool_id)
    }

    pub fn active_ids(&self) -> Vec<ToolId> {
        self.supervisor.active_ids()
    }
}
