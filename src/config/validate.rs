// src/config/validate.rs

use std::collections::HashMap;

use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ScriptdeckError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScriptdeckError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.plugin))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_plugins(cfg)?;
    validate_runner_section(cfg)?;
    validate_plugin_ids(cfg)?;
    validate_plugin_sources(cfg)?;
    warn_on_disabled_intervals(cfg);
    Ok(())
}

fn ensure_has_plugins(cfg: &RawConfigFile) -> Result<()> {
    if cfg.plugin.is_empty() {
        return Err(ScriptdeckError::ConfigError(
            "config must contain at least one [plugin.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_runner_section(cfg: &RawConfigFile) -> Result<()> {
    let section = &cfg.config;

    if section.interpreter.trim().is_empty() {
        return Err(ScriptdeckError::ConfigError(
            "[config].interpreter must not be empty".to_string(),
        ));
    }

    let ext = &section.script_extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(ScriptdeckError::ConfigError(format!(
            "[config].script_extension must be a bare extension like \"ts\" (got {ext:?})"
        )));
    }

    if let Some(ref timeout) = section.timeout {
        match parse_duration(timeout) {
            Some(d) if !d.is_zero() => {}
            _ => {
                return Err(ScriptdeckError::ConfigError(format!(
                    "[config].timeout must be a positive duration like \"30s\" (got {timeout:?})"
                )));
            }
        }
    }

    Ok(())
}

fn validate_plugin_ids(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<i64, &str> = HashMap::new();
    for (name, plugin) in cfg.plugin.iter() {
        if let Some(other) = seen.insert(plugin.id, name.as_str()) {
            return Err(ScriptdeckError::ConfigError(format!(
                "plugins '{}' and '{}' share id {}",
                other, name, plugin.id
            )));
        }
    }
    Ok(())
}

fn validate_plugin_sources(cfg: &RawConfigFile) -> Result<()> {
    for (name, plugin) in cfg.plugin.iter() {
        if plugin.code.is_some() == plugin.file.is_some() {
            return Err(ScriptdeckError::ConfigError(format!(
                "plugin '{}' must set exactly one of `code` or `file`",
                name
            )));
        }
    }
    Ok(())
}

fn warn_on_disabled_intervals(cfg: &RawConfigFile) {
    for (name, plugin) in cfg.plugin.iter() {
        if plugin.run_continuously && plugin.interval_seconds == 0 {
            warn!(
                plugin = %name,
                "run_continuously is set but interval_seconds = 0; continuous mode stays disabled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> std::result::Result<ConfigFile, ScriptdeckError> {
        let raw: RawConfigFile = toml::from_str(src).expect("test TOML parses");
        ConfigFile::try_from(raw)
    }

    #[test]
    fn defaults_apply_to_missing_config_section() {
        let cfg = parse(
            r#"
[plugin.hello]
id = 1
code = "console.log('hi')"
"#,
        )
        .expect("valid config");

        assert_eq!(cfg.config.interpreter, "bun");
        assert_eq!(cfg.config.interpreter_args, vec!["run".to_string()]);
        assert_eq!(cfg.config.script_extension, "ts");
        assert!(cfg.config.timeout.is_none());
        assert!(cfg.runner_settings().timeout.is_none());
    }

    #[test]
    fn empty_config_is_rejected() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ScriptdeckError::ConfigError(msg) if msg.contains("at least one")));
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = parse(
            r#"
[config]
script_extension = ".ts"

[plugin.a]
id = 1
code = ""
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptdeckError::ConfigError(msg) if msg.contains("script_extension")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse(
            r#"
[config]
timeout = "0s"

[plugin.a]
id = 1
code = ""
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptdeckError::ConfigError(msg) if msg.contains("timeout")));
    }

    #[test]
    fn code_and_file_together_are_rejected() {
        let err = parse(
            r#"
[plugin.a]
id = 1
code = "console.log(1)"
file = "a.ts"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptdeckError::ConfigError(msg) if msg.contains("exactly one")));
    }

    #[test]
    fn continuous_flag_with_zero_interval_is_accepted() {
        let cfg = parse(
            r#"
[plugin.a]
id = 1
code = ""
run_continuously = true
interval_seconds = 0
"#,
        )
        .expect("zero interval only disables continuous mode");
        assert!(cfg.plugin["a"].run_continuously);
    }
}
