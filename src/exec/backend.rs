// src/exec/backend.rs

//! Pluggable runner abstraction.
//!
//! The service layer talks to a `ScriptRunner` instead of a concrete process
//! runner. Production code uses [`super::ProcessRunner`]; tests can provide
//! their own implementation that never spawns a process.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::ExecutionError;
use crate::types::{ExecutionRequest, PluginId};

/// Future returned by [`ScriptRunner::execute`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ExecutionError>> + Send + 'a>>;

/// Executes a snippet of plugin source and returns its combined output.
pub trait ScriptRunner: Send + Sync {
    /// Run one request. Exactly one interpreter process per call, no retries.
    fn execute(&self, request: ExecutionRequest) -> RunFuture<'_>;

    /// `Run(id, code)`.
    fn run(&self, id: PluginId, code: &str) -> RunFuture<'_> {
        self.execute(ExecutionRequest {
            id,
            code: code.to_string(),
        })
    }
}

impl<R: ScriptRunner + ?Sized> ScriptRunner for Arc<R> {
    fn execute(&self, request: ExecutionRequest) -> RunFuture<'_> {
        (**self).execute(request)
    }
}
