//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// EFIS - telemetry ingestion and dispatch for a glass cockpit display
#[derive(Parser, Debug)]
#[command(
    name = "efis",
    author,
    version,
    about = "EFIS telemetry ingestion and dispatch core",
    long_about = "Receives flight and engine telemetry from a network simulator feed or an\n\
                  avionics bus, decodes it and drives the instrument panel from a single\n\
                  dispatch loop."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EFIS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EFIS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the display core until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),

    /// Send synthetic telemetry frames over UDP
    Emit(EmitArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults if omitted
    #[arg(short, long, env = "EFIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override operating mode from configuration
    #[arg(short, long, value_enum, env = "EFIS_MODE")]
    pub mode: Option<ModeArg>,

    /// Override telemetry bind host from configuration
    #[arg(long, env = "EFIS_HOST")]
    pub host: Option<String>,

    /// Override telemetry bind port from configuration
    #[arg(long, env = "EFIS_PORT")]
    pub port: Option<u16>,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0", env = "EFIS_DURATION")]
    pub duration: u64,

    /// Attach a log sink to every instrument
    #[arg(long)]
    pub log_instruments: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "EFIS_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "efis.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "efis.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show frame field layout
    #[arg(long)]
    pub layout: bool,

    /// Show bus parameter bindings
    #[arg(long)]
    pub bindings: bool,
}

/// Arguments for the `emit` command
#[derive(Parser, Debug, Clone)]
pub struct EmitArgs {
    /// Receiver address
    #[arg(short, long, default_value = "127.0.0.1:5000", env = "EFIS_EMIT_TARGET")]
    pub target: String,

    /// Frames per second
    #[arg(short, long, default_value = "30")]
    pub rate: f64,

    /// Number of frames to send (0 = until Ctrl+C)
    #[arg(short = 'n', long, default_value = "0")]
    pub count: u64,

    /// Take the field layout from this configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Operating mode as given on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Avionics bus parameters
    Normal,
    /// Network simulator feed
    Fgfs,
    /// Instrument sweep
    Test,
}

impl Cli {
    /// Prometheus exporter port for this invocation
    ///
    /// Only a live `run` exports metrics; port 0 and `--dry-run` disable it.
    pub fn metrics_port(&self) -> Option<u16> {
        match &self.command {
            Commands::Run(args) if args.metrics_port != 0 && !args.dry_run => {
                Some(args.metrics_port)
            }
            _ => None,
        }
    }
}

impl From<ModeArg> for contracts::Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => Self::Normal,
            ModeArg::Fgfs => Self::Fgfs,
            ModeArg::Test => Self::Test,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
