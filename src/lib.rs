//! # Studio Controller - desktop tool launcher and supervisor
//!
//! Registers self-contained tool bundles, launches each one as a child process
//! with its own private runtime, and follows it until it ends:
//! - Tool registry loaded once from a JSON document
//! - Environment validation before every launch
//! - Process supervision with a per-tool launch state machine
//! - File-based status channel with stale and partial-write tolerance
//! - Controller visibility that steps aside while tools run
//!
//! ## Architecture
//!
//! One controller owns all mutable state and drives a single event loop:
//! ```text
//!                     ┌──────────────────────────────────┐
//!   child exits   →   │            Controller            │
//!   poll ticks    →   │  ┌──────────┐ ┌───────────────┐  │
//!   close request →   │  │ Registry │ │  Supervisor   │  │
//!                     │  └──────────┘ └───────────────┘  │
//!                     │  ┌──────────┐ ┌───────────────┐  │
//!                     │  │  Status  │ │  Visibility   │  │
//!                     │  │ Monitors │ │  Coordinator  │  │
//!                     │  └──────────┘ └───────────────┘  │
//!                     └──────────────────────────────────┘
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod controller;
pub mod events;
pub mod status;
pub mod supervisor;
pub mod tools;
pub mod types;
pub mod visibility;

// Internal utilities
pub mod observability;
pub mod validation;

pub use controller::{Controller, RunOutcome};
pub use types::{Config, Error, Result};
