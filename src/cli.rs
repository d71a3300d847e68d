// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `scriptdeck`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptdeck",
    version,
    about = "Run small automation scripts on demand or on a timer.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Scriptdeck.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTDECK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the configured plugins in display order without running anything.
    List,

    /// Run one plugin once and print its output.
    Run {
        /// Plugin name or numeric id.
        plugin: String,
    },

    /// Start continuous mode for every eligible plugin until Ctrl-C.
    Start {
        /// Restrict to these plugins (name or id). May be repeated.
        #[arg(long, value_name = "PLUGIN")]
        only: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
