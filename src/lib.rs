// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::exec::ProcessRunner;
use crate::schedule::{ContinuousController, ControllerEvent, StartOutcome};
use crate::service::PluginService;
use crate::store::{MemoryPluginStore, PluginStore};
use crate::types::{Plugin, PluginId};

/// How long in-flight runs may finish after Ctrl-C before being killed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the plugin store and process runner
/// - the requested command (list / run once / continuous mode)
/// - Ctrl-C handling for continuous mode
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let plugins = cfg.to_plugins(&config_root_dir(&config_path))?;
    let store = MemoryPluginStore::from_plugins(plugins);

    match args.command {
        Command::List => {
            print_plugins(&store.get_all()?);
            Ok(())
        }
        Command::Run { plugin } => {
            let service = PluginService::new(store, ProcessRunner::new(cfg.runner_settings())?);
            run_once(&service, &plugin).await
        }
        Command::Start { only } => {
            let service = PluginService::new(store, ProcessRunner::new(cfg.runner_settings())?);
            run_continuous(Arc::new(service), &only).await
        }
    }
}

/// Directory that `file = ...` plugin sources are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "decks/Scriptdeck.toml"),
///   we use that directory.
/// - If it's just a bare filename, we fall back to the current working
///   directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

async fn run_once(
    service: &PluginService<MemoryPluginStore, ProcessRunner>,
    key: &str,
) -> Result<()> {
    let plugin = service
        .store()
        .find(key)
        .ok_or_else(|| anyhow!("no plugin named or numbered {key:?}"))?;

    let output = service.run_plugin(plugin.id).await?;
    print!("{output}");
    Ok(())
}

async fn run_continuous(
    service: Arc<PluginService<MemoryPluginStore, ProcessRunner>>,
    only: &[String],
) -> Result<()> {
    let selected = select_plugins(service.store(), only)?;
    let names: HashMap<PluginId, String> =
        selected.iter().map(|p| (p.id, p.name.clone())).collect();

    let (tx, mut rx) = mpsc::channel::<ControllerEvent>(64);
    let mut controller = ContinuousController::new(Arc::clone(&service), tx);

    for plugin in &selected {
        match controller.start(plugin) {
            StartOutcome::Started | StartOutcome::AlreadyRunning => {}
            StartOutcome::NotEligible(why) => {
                debug!(plugin = %plugin.name, ?why, "not eligible for continuous mode");
            }
        }
    }

    if controller.running_ids().is_empty() {
        warn!("no plugin is eligible for continuous mode (run_continuously + interval_seconds > 0)");
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("interrupt received; stopping continuous mode");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                if !report_event(&names, event) && controller.running_ids().is_empty() {
                    info!("every continuous loop has stopped");
                    break;
                }
            }
        }
    }

    // Keep reporting while loops wind down so none of them blocks on a full
    // channel.
    let shutdown = controller.shutdown(SHUTDOWN_GRACE);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = rx.recv() => match event {
                Some(event) => {
                    report_event(&names, event);
                }
                None => {
                    (&mut shutdown).await;
                    break;
                }
            },
        }
    }
    Ok(())
}

/// Print one controller event. Returns false once a loop has stopped.
fn report_event(names: &HashMap<PluginId, String>, event: ControllerEvent) -> bool {
    let name = |id: PluginId| names.get(&id).cloned().unwrap_or_else(|| id.to_string());

    match event {
        ControllerEvent::Output { id, output } => {
            let name = name(id);
            for line in output.lines() {
                println!("[{name}] {line}");
            }
            true
        }
        ControllerEvent::Failed { id, error, .. } => {
            eprintln!("[{}] run failed, continuous mode stopped:\n{error}", name(id));
            true
        }
        ControllerEvent::Stopped { id, reason } => {
            debug!(plugin = %name(id), ?reason, "loop stopped");
            false
        }
    }
}

/// Plugins in display order, optionally restricted to `only` (names or ids).
fn select_plugins(store: &MemoryPluginStore, only: &[String]) -> Result<Vec<Plugin>> {
    let all = store.get_all()?;
    if only.is_empty() {
        return Ok(all);
    }

    let mut wanted = Vec::with_capacity(only.len());
    for key in only {
        let plugin = store
            .find(key)
            .ok_or_else(|| anyhow!("no plugin named or numbered {key:?}"))?;
        wanted.push(plugin.id);
    }

    Ok(all.into_iter().filter(|p| wanted.contains(&p.id)).collect())
}

/// Dry listing: plugins in order with their continuous settings.
fn print_plugins(plugins: &[Plugin]) {
    println!("plugins ({}):", plugins.len());
    for plugin in plugins {
        println!("  - {} (id {})", plugin.name, plugin.id);
        match plugin.continuous_interval() {
            Some(period) => println!("      continuous: every {}s", period.as_secs()),
            None if plugin.run_continuously => {
                println!("      continuous: disabled (interval_seconds = 0)")
            }
            None => {}
        }
        println!("      code: {} line(s)", plugin.code.lines().count());
    }
}
