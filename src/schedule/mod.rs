// src/schedule/mod.rs

//! Continuous execution.
//!
//! Plugins flagged `run_continuously` with a non-zero interval can be put on a
//! timer: one invocation right away, then one per interval, until the user
//! stops it, an invocation fails, edit mode is entered, or the controller is
//! torn down.
//!
//! - [`controller`] owns one loop per plugin id and the start/stop guards.
//! - [`ticker`] is the per-plugin loop itself.
//!
//! Every loop is its own Tokio task with its own cancel handle, so plugins
//! never share a timer and one slow plugin never delays another.

use crate::types::PluginId;

pub mod controller;
pub mod ticker;

pub use controller::ContinuousController;

/// Per-plugin loop state as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Result of asking the controller to start a plugin's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A loop for this plugin is already armed; nothing changed.
    AlreadyRunning,
    NotEligible(Ineligible),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    /// `run_continuously` is false.
    NotContinuous,
    /// `interval_seconds` is 0.
    ZeroInterval,
}

/// Why a loop went back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop action.
    User,
    /// An invocation failed; the loop stopped itself.
    Error,
    /// The surrounding UI left run mode.
    EditMode,
    /// The controller was shut down or dropped.
    Teardown,
}

/// Notifications published by running loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A tick's invocation succeeded.
    Output { id: PluginId, output: String },
    /// A tick's invocation failed. A `Stopped { reason: Error }` follows.
    Failed {
        id: PluginId,
        error: String,
        status: u16,
    },
    /// The loop is gone; no further ticks until restarted.
    Stopped { id: PluginId, reason: StopReason },
}
