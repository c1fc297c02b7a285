//! Tool infrastructure: registry and environment validation.
//!
//! The controller owns tool *metadata* and launch contracts only; what a tool
//! does once started is its own business.

pub mod environment;
pub mod registry;

pub use environment::{validate, EnvironmentIssue};
pub use registry::{conventional_runtime_path, ToolDescriptor, ToolRegistry};
