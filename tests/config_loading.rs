mod common;
use crate::common::builders::{ConfigFileBuilder, PluginBuilder};
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use scriptdeck::config::{RawConfigFile, load_and_validate, load_from_path};
use scriptdeck::errors::ScriptdeckError;
use scriptdeck::store::{MemoryPluginStore, PluginStore};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn demo_deck_loads_with_file_sources() -> TestResult {
    init_tracing();

    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let demos = manifest.join("demos");
    let cfg = load_and_validate(demos.join("Scriptdeck.toml"))?;

    let settings = cfg.runner_settings();
    assert_eq!(settings.interpreter, "bun");
    assert_eq!(settings.interpreter_args, vec!["run".to_string()]);
    assert_eq!(settings.script_extension, "ts");
    assert_eq!(settings.timeout, Some(Duration::from_secs(30)));

    let plugins = cfg.to_plugins(&demos)?;
    let store = MemoryPluginStore::from_plugins(plugins);

    let names: Vec<String> = store.get_all()?.into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["clock", "answer", "uptime", "broken"]);

    let uptime = store.get_by_id(3)?;
    assert!(uptime.code.contains("process.uptime()"));
    assert_eq!(uptime.continuous_interval(), Some(Duration::from_secs(10)));

    let answer = store.get_by_id(2)?;
    assert!(answer.continuous_interval().is_none());
    assert_eq!(answer.code.lines().count(), 2);
    Ok(())
}

#[test]
fn duplicate_plugin_ids_are_rejected() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Scriptdeck.toml");
    fs::write(
        &path,
        r#"
[plugin.first]
id = 7
code = "console.log(1)"

[plugin.second]
id = 7
code = "console.log(2)"
"#,
    )?;

    let err = load_and_validate(&path).unwrap_err();
    match err {
        ScriptdeckError::ConfigError(msg) => {
            assert!(msg.contains("share id 7"), "unexpected message: {msg}");
            assert!(msg.contains("first") && msg.contains("second"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Scriptdeck.toml");
    fs::write(&path, "[plugin.a\nid = 1")?;

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ScriptdeckError::TomlError(_)));
    Ok(())
}

#[test]
fn missing_config_file_is_an_io_error() {
    init_tracing();

    let err = load_and_validate("/definitely/not/here/Scriptdeck.toml").unwrap_err();
    assert!(matches!(err, ScriptdeckError::IoError(_)));
}

#[test]
fn unreadable_source_file_names_the_plugin() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Scriptdeck.toml");
    fs::write(
        &path,
        r#"
[plugin.ghost]
id = 1
file = "scripts/ghost.ts"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    let err = cfg.to_plugins(dir.path()).unwrap_err();
    match err {
        ScriptdeckError::ConfigError(msg) => {
            assert!(msg.contains("ghost"));
            assert!(msg.contains("ghost.ts"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn builder_config_round_trips_into_plugins() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_interpreter("node", &[])
        .with_extension("mjs")
        .with_timeout("1500ms")
        .with_plugin(
            "ticker",
            PluginBuilder::new(5, "ticker")
                .code("console.log('tick')")
                .order(3)
                .every(2)
                .build_config(),
        )
        .build();

    let settings = cfg.runner_settings();
    assert_eq!(settings.interpreter, "node");
    assert!(settings.interpreter_args.is_empty());
    assert_eq!(settings.script_extension, "mjs");
    assert_eq!(settings.timeout, Some(Duration::from_millis(1500)));

    let plugins = cfg.to_plugins(std::path::Path::new("."))?;
    assert_eq!(plugins.len(), 1);
    let ticker = &plugins[0];
    assert_eq!((ticker.id, ticker.order_num), (5, 3));
    assert_eq!(ticker.continuous_interval(), Some(Duration::from_secs(2)));
    Ok(())
}

#[test]
fn bad_timeout_string_is_rejected() {
    init_tracing();

    let raw: RawConfigFile = toml::from_str(
        r#"
[config]
timeout = "soon"

[plugin.a]
id = 1
code = ""
"#,
    )
    .expect("test TOML parses");

    let err = scriptdeck::config::ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, ScriptdeckError::ConfigError(msg) if msg.contains("soon")));
}
