//! Status channel: a file-based, last-writer-wins link from engine to controller.
//!
//! An engine process writes [`StatusRecord`] snapshots with [`StatusWriter`];
//! the controller follows them with a [`StatusMonitor`] on its poll tick.

pub mod monitor;
pub mod record;
pub mod writer;

pub use monitor::{PollOutcome, StatusMonitor};
pub use record::{parse_timestamp, StatusKind, StatusRecord};
pub use writer::StatusWriter;
