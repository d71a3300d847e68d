#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use scriptdeck::config::{ConfigFile, ConfigSection, PluginConfig, RawConfigFile, RunnerSettings};
use scriptdeck::types::{Plugin, PluginId};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                plugin: BTreeMap::new(),
            },
        }
    }

    pub fn with_plugin(mut self, name: &str, plugin: PluginConfig) -> Self {
        self.config.plugin.insert(name.to_string(), plugin);
        self
    }

    pub fn with_interpreter(mut self, interpreter: &str, args: &[&str]) -> Self {
        self.config.config.interpreter = interpreter.to_string();
        self.config.config.interpreter_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.config.config.script_extension = ext.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = Some(timeout.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `Plugin` records as a store would hand them out.
pub struct PluginBuilder {
    plugin: Plugin,
}

impl PluginBuilder {
    pub fn new(id: PluginId, name: &str) -> Self {
        Self {
            plugin: Plugin {
                id,
                name: name.to_string(),
                code: String::new(),
                order_num: 0,
                run_continuously: false,
                interval_seconds: 0,
            },
        }
    }

    pub fn code(mut self, code: &str) -> Self {
        self.plugin.code = code.to_string();
        self
    }

    pub fn order(mut self, order_num: i64) -> Self {
        self.plugin.order_num = order_num;
        self
    }

    /// Mark as continuous with the given interval.
    pub fn every(mut self, interval_seconds: u64) -> Self {
        self.plugin.run_continuously = true;
        self.plugin.interval_seconds = interval_seconds;
        self
    }

    pub fn build(self) -> Plugin {
        self.plugin
    }

    /// The same plugin as a `[plugin.<name>]` config entry with inline code.
    pub fn build_config(self) -> PluginConfig {
        PluginConfig {
            id: self.plugin.id,
            code: Some(self.plugin.code),
            file: None,
            order_num: self.plugin.order_num,
            run_continuously: self.plugin.run_continuously,
            interval_seconds: self.plugin.interval_seconds,
        }
    }
}

/// Runner settings that execute plugin code with `sh`, so process tests do not
/// depend on `bun` being installed.
pub fn sh_runner_settings(scratch_dir: &Path) -> RunnerSettings {
    RunnerSettings {
        interpreter: "sh".to_string(),
        interpreter_args: Vec::new(),
        script_extension: "sh".to_string(),
        scratch_dir: scratch_dir.to_path_buf(),
        timeout: None,
    }
}
