// src/exec/mod.rs

//! Plugin execution layer.
//!
//! - [`backend`] defines the `ScriptRunner` trait that the service layer and
//!   tests program against.
//! - [`runner`] is the production `ProcessRunner`: code → scratch file →
//!   interpreter process → merged output.
//! - [`artifact`] owns the per-invocation scratch file and its cleanup.
//! - [`output`] drains stdout and stderr into a single buffer.
//! - [`process_group`] kills a timed-out script together with its children.

pub mod artifact;
pub mod backend;
pub mod output;
pub mod process_group;
pub mod runner;

pub use artifact::ScriptArtifact;
pub use backend::{RunFuture, ScriptRunner};
pub use runner::ProcessRunner;
