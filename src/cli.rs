// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `deploycfg`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deploycfg",
    version,
    about = "Validate deployment configuration from the environment and print the resolved result.",
    long_about = None
)]
pub struct CliArgs {
    /// TOML file of `KEY = value` overrides layered over the environment.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Ignore the process environment; use only `--env-file` and defaults.
    #[arg(long)]
    pub no_process_env: bool,

    /// Print the schema (fields, types, defaults, variables) and exit.
    #[arg(long)]
    pub print_schema: bool,

    /// Only print this section (e.g. `server`, `process`).
    #[arg(long, value_name = "NAME")]
    pub section: Option<String>,

    /// Report every configuration problem instead of printing the result.
    #[arg(long)]
    pub check: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPLOYCFG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
