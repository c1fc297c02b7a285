//! Controller visibility.
//!
//! The controller steps aside while a launched tool runs and comes back when
//! that tool ends. Presentation itself is behind [`Presenter`] so the same
//! policy drives a console front end, a window, or a mock in tests.

use std::collections::HashSet;

use crate::events::{LifecycleEvent, LifecycleSink, Notification};
use crate::status::StatusRecord;
use crate::types::ToolId;

/// Presentation surface driven by the controller.
#[cfg_attr(test, mockall::automock)]
pub trait Presenter {
    /// Hide the controller to free the foreground for a tool.
    fn suspend(&mut self);
    /// Show the controller again and bring it to the front.
    fn resume(&mut self);
    /// Ask whether to close while `running` tools are still active.
    fn confirm_close(&mut self, running: &[ToolId]) -> bool;
    /// Non-blocking message.
    fn notify(&mut self, notification: &Notification);
    fn show_progress(&mut self, tool_id: &ToolId, record: &StatusRecord);
}

#[derive(Debug)]
pub struct VisibilityCoordinator<P> {
    presenter: P,
    confirm_close: bool,
    tracked: HashSet<ToolId>,
}

impl<P: Presenter> VisibilityCoordinator<P> {
    pub fn new(presenter: P, confirm_close: bool) -> Self {
        Self {
            presenter,
            confirm_close,
            tracked: HashSet::new(),
        }
    }

    /// A launch was accepted; step aside until it ends.
    pub fn on_launched(&mut self, tool_id: &ToolId) {
        self.tracked.insert(tool_id.clone());
        tracing::debug!(tool_id = %tool_id, "controller_suspended");
        self.presenter.suspend();
    }

    /// Whether the controller may close given the tools still `active`.
    pub fn request_close(&mut self, active: &[ToolId]) -> bool {
        if active.is_empty() || !self.confirm_close {
            return true;
        }
        let confirmed = self.presenter.confirm_close(active);
        tracing::info!(running = active.len(), confirmed, "close_requested");
        confirmed
    }

    pub fn is_tracking(&self, tool_id: &ToolId) -> bool {
        self.tracked.contains(tool_id)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}

impl<P: Presenter> LifecycleSink for VisibilityCoordinator<P> {
    fn on_lifecycle(&mut self, event: &LifecycleEvent) {
        let tool_id = event.tool_id();
        // Resume once per launch; untracked ids never resume.
        if self.tracked.remove(tool_id) {
            tracing::debug!(tool_id = %tool_id, event = event.event_type(), "controller_resumed");
            self.presenter.resume();
        }
    }
}
