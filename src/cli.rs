// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `calcdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "calcdag",
    version,
    about = "Evaluate arithmetic expressions as a graph of dependent operations.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing `Calcdag.toml` at the default location means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Calcdag.toml")]
    pub config: String,

    /// Number of calculation workers (overrides `[orchestrator].worker_count`).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Simulated time per calculation, e.g. `0ms` or `2s`.
    #[arg(long, value_name = "DURATION")]
    pub operation_duration: Option<String>,

    /// Interval between discovery sweeps, e.g. `5s`.
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CALCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Owner tag stored on every created operation.
    #[arg(long, value_name = "TAG")]
    pub owner: Option<String>,

    /// Print one JSON report per expression instead of plain text.
    #[arg(long)]
    pub json: bool,

    /// Parse and print the operations each expression turns into, without
    /// calculating anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Expressions to evaluate, e.g. `"2+2*2"`.
    #[arg(value_name = "EXPR", required = true)]
    pub expressions: Vec<String>,
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
