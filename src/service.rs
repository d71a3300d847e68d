// src/service.rs

//! "Run plugin by id" boundary.
//!
//! This is what a request handler sits on: look the plugin up, run its
//! current code once, and hand back either the output text or an error that
//! already knows which status code it maps to.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::debug;

use crate::errors::{ExecutionError, ScriptdeckError};
use crate::exec::ScriptRunner;
use crate::store::PluginStore;
use crate::types::{ExecutionRequest, PluginId};

/// Why a "run plugin" request failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Plugin not found: {0}")]
    NotFound(PluginId),

    #[error(transparent)]
    Store(ScriptdeckError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ServiceError {
    /// Status code a request handler answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Store(_) | ServiceError::Execution(_) => 500,
        }
    }

    fn from_store(id: PluginId, err: ScriptdeckError) -> Self {
        match err {
            ScriptdeckError::PluginNotFound(_) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

/// Future returned by [`PluginInvoker::invoke`].
pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ServiceError>> + Send + 'a>>;

/// Something that can run a stored plugin by id.
///
/// The continuous controller calls this once per tick; tests substitute a
/// fake that never touches a store or spawns a process.
pub trait PluginInvoker: Send + Sync + 'static {
    fn invoke(&self, id: PluginId) -> InvokeFuture<'_>;
}

/// Couples a plugin store with a script runner.
#[derive(Debug, Clone)]
pub struct PluginService<S, R> {
    store: S,
    runner: R,
}

impl<S, R> PluginService<S, R>
where
    S: PluginStore,
    R: ScriptRunner,
{
    pub fn new(store: S, runner: R) -> Self {
        Self { store, runner }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Fetch the plugin's current code and run it exactly once.
    pub async fn run_plugin(&self, id: PluginId) -> Result<String, ServiceError> {
        let plugin = self
            .store
            .get_by_id(id)
            .map_err(|e| ServiceError::from_store(id, e))?;

        debug!(plugin_id = id, name = %plugin.name, "running plugin");

        Ok(self.runner.execute(ExecutionRequest::from(&plugin)).await?)
    }
}

impl<S, R> PluginInvoker for PluginService<S, R>
where
    S: PluginStore + 'static,
    R: ScriptRunner + 'static,
{
    fn invoke(&self, id: PluginId) -> InvokeFuture<'_> {
        Box::pin(self.run_plugin(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::exec::RunFuture;
    use crate::store::MemoryPluginStore;
    use crate::types::Plugin;

    /// Echoes the code back, or fails when the code says so.
    #[derive(Debug, Default)]
    struct EchoRunner {
        seen: Mutex<Vec<ExecutionRequest>>,
    }

    impl ScriptRunner for EchoRunner {
        fn execute(&self, request: ExecutionRequest) -> RunFuture<'_> {
            self.seen.lock().unwrap().push(request.clone());
            Box::pin(async move {
                if request.code == "throw" {
                    Err(ExecutionError::ProcessExecution {
                        id: request.id,
                        status: "exit status: 1".to_string(),
                        code: Some(1),
                        output: "Error: boom".to_string(),
                    })
                } else {
                    Ok(request.code)
                }
            })
        }
    }

    fn store() -> MemoryPluginStore {
        MemoryPluginStore::from_plugins([
            Plugin {
                id: 1,
                name: "ok".to_string(),
                code: "hello".to_string(),
                order_num: 0,
                run_continuously: false,
                interval_seconds: 0,
            },
            Plugin {
                id: 2,
                name: "bad".to_string(),
                code: "throw".to_string(),
                order_num: 1,
                run_continuously: false,
                interval_seconds: 0,
            },
        ])
    }

    #[tokio::test]
    async fn runs_current_code_of_stored_plugin() {
        let runner = Arc::new(EchoRunner::default());
        let service = PluginService::new(store(), Arc::clone(&runner));

        assert_eq!(service.run_plugin(1).await.unwrap(), "hello");
        assert_eq!(
            runner.seen.lock().unwrap().as_slice(),
            &[ExecutionRequest {
                id: 1,
                code: "hello".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn unknown_plugin_maps_to_404_without_running() {
        let runner = Arc::new(EchoRunner::default());
        let service = PluginService::new(store(), Arc::clone(&runner));

        let err = service.run_plugin(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(99)));
        assert_eq!(err.http_status(), 404);
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn execution_failure_maps_to_500_with_output() {
        let service = PluginService::new(store(), EchoRunner::default());

        let err = service.invoke(2).await.unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("Error: boom"));
    }
}
