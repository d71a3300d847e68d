// src/schedule/controller.rs

//! Start/stop bookkeeping for continuous loops.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::schedule::ticker::{LoopSpec, run_loop};
use crate::schedule::{ControllerEvent, Ineligible, LoopState, StartOutcome, StopReason};
use crate::service::PluginInvoker;
use crate::types::{Plugin, PluginId};

/// Internal handle for one plugin's loop.
///
/// - `cancel` asks the loop to stop after its current invocation, if any.
/// - `running` is shared with the loop, which clears it when it stops on its
///   own (auto-stop on error).
/// - `handle` is the Tokio task running the loop.
#[derive(Debug)]
struct ActiveLoop {
    cancel: Option<oneshot::Sender<StopReason>>,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ActiveLoop {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.handle.is_finished()
    }

    /// Request a stop. Returns false if the loop was already idle.
    fn request_stop(&mut self, reason: StopReason) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if let Some(cancel) = self.cancel.take() {
            // The loop may have just exited on its own; nothing to do then.
            let _ = cancel.send(reason);
        }
        was_running && !self.handle.is_finished()
    }
}

/// Owns at most one armed loop per plugin id.
///
/// Must be used from within a Tokio runtime: `start` spawns a task.
/// Dropping the controller aborts every loop it still owns.
pub struct ContinuousController<I: PluginInvoker> {
    invoker: Arc<I>,
    events: mpsc::Sender<ControllerEvent>,
    active: HashMap<PluginId, ActiveLoop>,
    /// Stopped loops that may still be finishing an in-flight invocation.
    retired: Vec<JoinHandle<()>>,
}

impl<I: PluginInvoker> std::fmt::Debug for ContinuousController<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuousController")
            .field("running", &self.running_ids())
            .field("retired", &self.retired.len())
            .finish_non_exhaustive()
    }
}

impl<I: PluginInvoker> ContinuousController<I> {
    /// Create a controller that publishes loop notifications on `events`.
    pub fn new(invoker: Arc<I>, events: mpsc::Sender<ControllerEvent>) -> Self {
        Self {
            invoker,
            events,
            active: HashMap::new(),
            retired: Vec::new(),
        }
    }

    /// `Idle → Running` for `plugin`.
    ///
    /// Issues one invocation immediately, then one every `interval_seconds`.
    /// Starting a plugin whose loop is already armed is a no-op.
    pub fn start(&mut self, plugin: &Plugin) -> StartOutcome {
        let period = match plugin.continuous_interval() {
            Some(period) => period,
            None if !plugin.run_continuously => {
                return StartOutcome::NotEligible(Ineligible::NotContinuous);
            }
            None => return StartOutcome::NotEligible(Ineligible::ZeroInterval),
        };

        if let Some(existing) = self.active.get(&plugin.id) {
            if existing.is_running() {
                debug!(
                    plugin_id = plugin.id,
                    "continuous loop already running; ignoring start request"
                );
                return StartOutcome::AlreadyRunning;
            }
        }

        if let Some(old) = self.active.remove(&plugin.id) {
            self.retire(old.handle);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel::<StopReason>();
        let running = Arc::new(AtomicBool::new(true));
        let spec = LoopSpec {
            id: plugin.id,
            name: plugin.name.clone(),
            period,
        };

        let handle = tokio::spawn(run_loop(
            spec,
            Arc::clone(&self.invoker),
            self.events.clone(),
            cancel_rx,
            Arc::clone(&running),
        ));

        self.active.insert(
            plugin.id,
            ActiveLoop {
                cancel: Some(cancel_tx),
                running,
                handle,
            },
        );

        info!(
            plugin_id = plugin.id,
            plugin = %plugin.name,
            interval_seconds = plugin.interval_seconds,
            "continuous mode started"
        );
        StartOutcome::Started
    }

    /// Explicit user stop. Returns false if the plugin was not running.
    pub fn stop(&mut self, id: PluginId) -> bool {
        self.stop_with(id, StopReason::User)
    }

    /// Leave run mode: every armed loop is stopped. Returns how many were.
    pub fn enter_edit_mode(&mut self) -> usize {
        let ids: Vec<PluginId> = self.active.keys().copied().collect();
        let stopped = ids
            .into_iter()
            .filter(|id| self.stop_with(*id, StopReason::EditMode))
            .count();
        info!(stopped, "edit mode entered; continuous loops cancelled");
        stopped
    }

    pub fn state(&self, id: PluginId) -> LoopState {
        match self.active.get(&id) {
            Some(active) if active.is_running() => LoopState::Running,
            _ => LoopState::Idle,
        }
    }

    /// Ids of every plugin whose loop is currently armed, ascending.
    pub fn running_ids(&self) -> Vec<PluginId> {
        let mut ids: Vec<PluginId> = self
            .active
            .iter()
            .filter(|(_, active)| active.is_running())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Stop every loop and wait for them to exit.
    ///
    /// Loops get `grace` to finish an in-flight invocation; anything still
    /// running after that is aborted, which kills its interpreter process.
    pub async fn shutdown(mut self, grace: Duration) {
        let mut handles = std::mem::take(&mut self.retired);
        for (_, mut active) in self.active.drain() {
            active.request_stop(StopReason::Teardown);
            handles.push(active.handle);
        }

        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let joined = tokio::time::timeout(grace, async {
            for handle in handles {
                let _ = handle.await;
            }
        })
        .await;

        if joined.is_err() {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "continuous loops still busy after grace period; aborting"
            );
            for abort in aborts {
                abort.abort();
            }
        }
    }

    fn stop_with(&mut self, id: PluginId, reason: StopReason) -> bool {
        let Some(active) = self.active.get_mut(&id) else {
            return false;
        };
        let stopped = active.request_stop(reason);
        if stopped {
            info!(plugin_id = id, ?reason, "continuous mode stopped");
        }
        stopped
    }

    fn retire(&mut self, handle: JoinHandle<()>) {
        self.retired.retain(|h| !h.is_finished());
        if !handle.is_finished() {
            self.retired.push(handle);
        }
    }
}

impl<I: PluginInvoker> Drop for ContinuousController<I> {
    fn drop(&mut self) {
        for (_, active) in self.active.drain() {
            active.handle.abort();
        }
        for handle in self.retired.drain(..) {
            handle.abort();
        }
    }
}
