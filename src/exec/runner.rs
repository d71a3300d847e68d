// src/exec/runner.rs

//! Process-backed plugin runner.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunnerSettings;
use crate::errors::{ExecutionError, Result};
use crate::exec::artifact::ScriptArtifact;
use crate::exec::backend::{RunFuture, ScriptRunner};
use crate::exec::output::MergedOutput;
use crate::exec::process_group::{self, ProcessGroup};
use crate::types::ExecutionRequest;

/// How long pipe readers may keep draining after a timed-out child is killed.
const KILL_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs plugin code by writing it to a scratch file and handing that file to
/// an external interpreter (`bun run <file>` by default).
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    settings: RunnerSettings,
}

impl ProcessRunner {
    /// Create the runner, creating the scratch directory (and its parents)
    /// if it does not exist yet.
    pub fn new(settings: RunnerSettings) -> Result<Self> {
        std::fs::create_dir_all(&settings.scratch_dir).with_context(|| {
            format!(
                "creating scratch directory {}",
                settings.scratch_dir.display()
            )
        })?;

        debug!(
            scratch_dir = %settings.scratch_dir.display(),
            interpreter = %settings.interpreter,
            "process runner ready"
        );

        Ok(Self { settings })
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.settings.scratch_dir
    }

    async fn run_request(
        &self,
        request: ExecutionRequest,
    ) -> std::result::Result<String, ExecutionError> {
        let id = request.id;
        let started = Instant::now();

        let artifact = ScriptArtifact::write(
            &self.settings.scratch_dir,
            id,
            &self.settings.script_extension,
            &request.code,
        )
        .map_err(|source| ExecutionError::TempFileWrite { id, source })?;

        debug!(
            plugin_id = id,
            artifact = %artifact.path().display(),
            bytes = request.code.len(),
            "materialized plugin script"
        );

        let mut cmd = Command::new(&self.settings.interpreter);
        cmd.args(&self.settings.interpreter_args)
            .arg(artifact.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        process_group::isolate(&mut cmd);

        let mut child = cmd.spawn().map_err(|source| ExecutionError::ProcessSpawn {
            id,
            program: self.settings.interpreter.clone(),
            source,
        })?;
        let mut group = ProcessGroup::of(&child);
        let mut output = MergedOutput::capture(&mut child);

        // The run ends when the interpreter has exited and every holder of
        // its pipes (background jobs included) has closed them.
        let completed = async {
            let status = child.wait().await?;
            output.drain().await?;
            Ok::<_, std::io::Error>(status)
        };

        let timed = match self.settings.timeout {
            None => Ok(completed.await),
            Some(limit) => tokio::time::timeout(limit, completed)
                .await
                .map_err(|_elapsed| limit),
        };

        let waited = match timed {
            Ok(res) => res,
            Err(limit) => {
                warn!(
                    plugin_id = id,
                    timeout_ms = limit.as_millis() as u64,
                    "plugin exceeded its time limit; killing process group"
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    debug!(plugin_id = id, error = %e, "interpreter already exited");
                }
                let captured = output.finish_within(KILL_DRAIN_GRACE).await;
                return Err(ExecutionError::Timeout {
                    id,
                    after: limit,
                    output: captured,
                });
            }
        };
        let status = waited.map_err(|source| ExecutionError::ProcessWait { id, source })?;
        group.release();
        let text = output.into_text();

        let artifact_path = artifact.path().to_path_buf();
        if let Err(e) = artifact.remove() {
            warn!(
                plugin_id = id,
                artifact = %artifact_path.display(),
                error = %e,
                "failed to remove plugin script"
            );
        }

        let code = status.code();
        info!(
            plugin_id = id,
            exit_code = code.unwrap_or(-1),
            success = status.success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plugin process exited"
        );

        if status.success() {
            Ok(text)
        } else {
            Err(ExecutionError::ProcessExecution {
                id,
                status: status.to_string(),
                code,
                output: text,
            })
        }
    }
}

impl ScriptRunner for ProcessRunner {
    fn execute(&self, request: ExecutionRequest) -> RunFuture<'_> {
        Box::pin(self.run_request(request))
    }
}
