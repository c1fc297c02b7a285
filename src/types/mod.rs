//! Core types for the controller.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (ToolId, LaunchId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Controller and observability settings

mod config;
mod errors;
mod ids;

pub use config::{Config, ControllerConfig, ObservabilityConfig};
pub use errors::{Error, Result, Severity};
pub use ids::{LaunchId, ToolId};
