// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ScriptdeckError`] covers configuration, storage and wiring failures.
//! - [`ExecutionError`] is what a single plugin run fails with. It is always
//!   returned to the caller as a value; the runner never logs-and-swallows.

use std::time::Duration;

use thiserror::Error;

use crate::types::PluginId;

#[derive(Error, Debug)]
pub enum ScriptdeckError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single `Run(id, code)` invocation.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The script artifact could not be created or written. No process was
    /// spawned.
    #[error("failed to write temp file for plugin {id}: {source}")]
    TempFileWrite {
        id: PluginId,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter binary could not be located or started.
    #[error("failed to run plugin {id}: could not spawn `{program}`: {source}")]
    ProcessSpawn {
        id: PluginId,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child or reading its pipes failed.
    #[error("failed to run plugin {id}: {source}")]
    ProcessWait {
        id: PluginId,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter ran but exited unsuccessfully (usually a thrown
    /// script exception).
    #[error("failed to run plugin {id}: {status}\nOutput: {output}")]
    ProcessExecution {
        id: PluginId,
        status: String,
        code: Option<i32>,
        output: String,
    },

    /// The run exceeded the configured timeout and the child was killed.
    #[error("failed to run plugin {id}: timed out after {after:?}\nOutput: {output}")]
    Timeout {
        id: PluginId,
        after: Duration,
        output: String,
    },
}

impl ExecutionError {
    /// Plugin id the failed invocation was made for.
    pub fn plugin_id(&self) -> PluginId {
        match self {
            ExecutionError::TempFileWrite { id, .. }
            | ExecutionError::ProcessSpawn { id, .. }
            | ExecutionError::ProcessWait { id, .. }
            | ExecutionError::ProcessExecution { id, .. }
            | ExecutionError::Timeout { id, .. } => *id,
        }
    }

    /// Output captured from the child before it failed, if a child ran.
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionError::ProcessExecution { output, .. }
            | ExecutionError::Timeout { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScriptdeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_failure_message_embeds_status_and_output() {
        let err = ExecutionError::ProcessExecution {
            id: 7,
            status: "exit status: 1".to_string(),
            code: Some(1),
            output: "TypeError: undefined is not an object".to_string(),
        };

        let text = err.to_string();
        assert!(text.contains("exit status: 1"));
        assert!(text.contains("TypeError: undefined is not an object"));
        assert_eq!(err.plugin_id(), 7);
        assert_eq!(err.output(), Some("TypeError: undefined is not an object"));
    }

    #[test]
    fn spawn_failure_has_no_captured_output() {
        let err = ExecutionError::ProcessSpawn {
            id: 3,
            program: "bun".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.output().is_none());
        assert!(err.to_string().contains("`bun`"));
    }
}
