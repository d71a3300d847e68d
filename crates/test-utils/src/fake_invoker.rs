use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scriptdeck::errors::ExecutionError;
use scriptdeck::service::{InvokeFuture, PluginInvoker, ServiceError};
use scriptdeck::types::PluginId;
use tokio::time::Instant;

/// One recorded invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub id: PluginId,
    /// 1-based call number for this plugin id.
    pub call: usize,
    pub at: Instant,
}

/// A fake invoker that:
/// - records every invocation with the (Tokio) time it happened
/// - answers `"<id>:<call>"`, optionally after a (per-id) delay
/// - fails on the calls registered with [`FakeInvoker::fail_on`].
#[derive(Debug, Clone, Default)]
pub struct FakeInvoker {
    calls: Arc<Mutex<Vec<Invocation>>>,
    failures: Arc<Mutex<HashSet<(PluginId, usize)>>>,
    delay: Option<Duration>,
    delays: HashMap<PluginId, Duration>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation takes `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Invocations of `id` take `delay`, overriding [`FakeInvoker::with_delay`].
    pub fn with_delay_for(mut self, id: PluginId, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    /// Make the `call`-th invocation (1-based) of `id` fail.
    pub fn fail_on(self, id: PluginId, call: usize) -> Self {
        self.failures.lock().unwrap().insert((id, call));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: PluginId) -> Vec<Invocation> {
        self.calls().into_iter().filter(|c| c.id == id).collect()
    }
}

impl PluginInvoker for FakeInvoker {
    fn invoke(&self, id: PluginId) -> InvokeFuture<'_> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let call = calls.iter().filter(|c| c.id == id).count() + 1;
            calls.push(Invocation {
                id,
                call,
                at: Instant::now(),
            });
            call
        };
        let fail = self.failures.lock().unwrap().contains(&(id, call));
        let delay = self.delays.get(&id).copied().or(self.delay);

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(ServiceError::Execution(ExecutionError::ProcessExecution {
                    id,
                    status: "exit status: 1".to_string(),
                    code: Some(1),
                    output: format!("scripted failure on call {call}"),
                }));
            }
            Ok(format!("{id}:{call}"))
        })
    }
}
