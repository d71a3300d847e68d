// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::duration::parse_duration;
use crate::errors::{Result, ScriptdeckError};
use crate::types::{Plugin, PluginId};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// interpreter = "bun"
/// interpreter_args = ["run"]
/// script_extension = "ts"
/// timeout = "30s"
///
/// [plugin.clock]
/// id = 1
/// code = "console.log(new Date().toISOString())"
/// run_continuously = true
/// interval_seconds = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Runner settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All plugins from `[plugin.<name>]`, keyed by plugin name.
    #[serde(default)]
    pub plugin: BTreeMap<String, PluginConfig>,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub plugin: BTreeMap<String, PluginConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        plugin: BTreeMap<String, PluginConfig>,
    ) -> Self {
        Self { config, plugin }
    }

    /// Runner settings derived from `[config]`.
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings::from_section(&self.config)
    }

    /// Materialize every plugin, reading `file = ...` sources relative to
    /// `base_dir`.
    pub fn to_plugins(&self, base_dir: &Path) -> Result<Vec<Plugin>> {
        self.plugin
            .iter()
            .map(|(name, cfg)| cfg.to_plugin(name, base_dir))
            .collect()
    }
}

/// `[config]` section: how plugin code gets executed.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Interpreter binary, looked up on `PATH`.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Arguments placed before the script path.
    #[serde(default = "default_interpreter_args")]
    pub interpreter_args: Vec<String>,

    /// Extension given to materialized scripts, without the dot.
    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// Scratch directory for script artifacts. Defaults to
    /// `<os temp dir>/scriptdeck-plugins`.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Optional per-run time limit such as `"30s"`. Without it a run waits
    /// for the interpreter indefinitely.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_interpreter() -> String {
    "bun".to_string()
}

fn default_interpreter_args() -> Vec<String> {
    vec!["run".to_string()]
}

fn default_script_extension() -> String {
    "ts".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            interpreter_args: default_interpreter_args(),
            script_extension: default_script_extension(),
            scratch_dir: None,
            timeout: None,
        }
    }
}

/// `[plugin.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub id: PluginId,

    /// Inline source. Mutually exclusive with `file`.
    #[serde(default)]
    pub code: Option<String>,

    /// Source file, relative to the config file. Mutually exclusive with
    /// `code`.
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub order_num: i64,

    #[serde(default)]
    pub run_continuously: bool,

    #[serde(default)]
    pub interval_seconds: u64,
}

impl PluginConfig {
    fn to_plugin(&self, name: &str, base_dir: &Path) -> Result<Plugin> {
        let code = match (&self.code, &self.file) {
            (Some(code), None) => code.clone(),
            (None, Some(file)) => {
                let path = base_dir.join(file);
                std::fs::read_to_string(&path).map_err(|e| {
                    ScriptdeckError::ConfigError(format!(
                        "plugin '{name}': cannot read source file {}: {e}",
                        path.display()
                    ))
                })?
            }
            _ => {
                return Err(ScriptdeckError::ConfigError(format!(
                    "plugin '{name}' must set exactly one of `code` or `file`"
                )));
            }
        };

        Ok(Plugin {
            id: self.id,
            name: name.to_string(),
            code,
            order_num: self.order_num,
            run_continuously: self.run_continuously,
            interval_seconds: self.interval_seconds,
        })
    }
}

/// Everything the process runner needs, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    pub interpreter: String,
    pub interpreter_args: Vec<String>,
    pub script_extension: String,
    pub scratch_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl RunnerSettings {
    pub fn from_section(section: &ConfigSection) -> Self {
        Self {
            interpreter: section.interpreter.clone(),
            interpreter_args: section.interpreter_args.clone(),
            script_extension: section.script_extension.clone(),
            scratch_dir: section
                .scratch_dir
                .clone()
                .unwrap_or_else(default_scratch_dir),
            timeout: section.timeout.as_deref().and_then(parse_duration),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from_section(&ConfigSection::default())
    }
}

/// `<os temp dir>/scriptdeck-plugins`.
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("scriptdeck-plugins")
}
