// src/schedule/ticker.rs

//! The per-plugin loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::schedule::{ControllerEvent, StopReason};
use crate::service::PluginInvoker;
use crate::types::PluginId;

/// What a loop needs to know about its plugin.
#[derive(Debug, Clone)]
pub struct LoopSpec {
    pub id: PluginId,
    pub name: String,
    pub period: Duration,
}

/// Run one plugin on a fixed period until cancelled or an invocation fails.
///
/// - The first tick fires immediately.
/// - Ticks never overlap: the next tick waits for the current invocation, and
///   ticks missed meanwhile are not replayed in a burst.
/// - A cancellation that arrives mid-invocation lets that invocation finish;
///   no further tick fires afterwards.
/// - `running` is cleared before the final `Stopped` event is sent.
/// - A stop request is honoured even while the event channel is full; the
///   undelivered event is dropped. `Stopped { reason: Teardown }` is only
///   sent if the channel has room.
pub async fn run_loop<I>(
    spec: LoopSpec,
    invoker: Arc<I>,
    events: mpsc::Sender<ControllerEvent>,
    mut cancel_rx: oneshot::Receiver<StopReason>,
    running: Arc<AtomicBool>,
) where
    I: PluginInvoker + ?Sized,
{
    let id = spec.id;
    let mut ticker = tokio::time::interval(spec.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        plugin_id = id,
        plugin = %spec.name,
        period_secs = spec.period.as_secs(),
        "continuous loop started"
    );

    let mut ticks: u64 = 0;
    let reason = loop {
        tokio::select! {
            biased;
            cancel = &mut cancel_rx => {
                break cancel.unwrap_or(StopReason::Teardown);
            }
            _ = ticker.tick() => {}
        }

        ticks += 1;
        debug!(plugin_id = id, tick = ticks, "continuous tick");

        match invoker.invoke(id).await {
            Ok(output) => {
                // A full channel must not hide a stop request.
                tokio::select! {
                    biased;
                    _ = events.send(ControllerEvent::Output { id, output }) => {}
                    cancel = &mut cancel_rx => {
                        debug!(plugin_id = id, "stop requested while publishing; output dropped");
                        break cancel.unwrap_or(StopReason::Teardown);
                    }
                }
            }
            Err(err) => {
                warn!(
                    plugin_id = id,
                    plugin = %spec.name,
                    tick = ticks,
                    error = %err,
                    "continuous run failed; stopping loop"
                );
                running.store(false, Ordering::Release);
                let failed = ControllerEvent::Failed {
                    id,
                    error: err.to_string(),
                    status: err.http_status(),
                };
                tokio::select! {
                    biased;
                    _ = events.send(failed) => {}
                    cancel = &mut cancel_rx => break cancel.unwrap_or(StopReason::Teardown),
                }
                // A stop requested during the failed run keeps its own reason.
                break cancel_rx.try_recv().unwrap_or(StopReason::Error);
            }
        }
    };

    running.store(false, Ordering::Release);
    info!(
        plugin_id = id,
        plugin = %spec.name,
        ticks,
        ?reason,
        "continuous loop stopped"
    );
    let stopped = ControllerEvent::Stopped { id, reason };
    if reason == StopReason::Teardown {
        // Nobody may be draining the channel any more.
        if events.try_send(stopped).is_err() {
            debug!(plugin_id = id, "teardown notification dropped");
        }
    } else {
        let _ = events.send(stopped).await;
    }
}
