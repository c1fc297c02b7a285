//! Event infrastructure: supervisor observations, lifecycle dispatch and notifications.

pub mod lifecycle;
pub mod notification;

pub use lifecycle::{
    event_channel, EventReceiver, EventSender, LifecycleEvent, LifecycleSink, SupervisorEvent,
};
pub use notification::Notification;
