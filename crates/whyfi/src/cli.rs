//! Clap derive structures for the `whyfi` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// whyfi -- why is my Wi-Fi slow?
#[derive(Debug, Parser)]
#[command(
    name = "whyfi",
    version,
    about = "Diagnose Wi-Fi and internet health from the command line",
    long_about = "Diagnoses Wi-Fi health: measures router, internet and DNS latency,\n\
        tracks jitter and loss over time, runs throughput tests, and explains\n\
        what looks wrong.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "WHYFI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WHYFI_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty tables (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one probe cycle and explain the result
    #[command(alias = "c")]
    Check(CheckArgs),

    /// Probe continuously, one line per cycle, until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Measure throughput and responsiveness under load
    #[command(alias = "speed")]
    Speedtest,

    /// Manage the config file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Probe Commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Also run a throughput test after the probe cycle
    #[arg(long, short = 's')]
    pub speed_test: bool,

    /// Exit with a non-zero status when any critical issue is found
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycles (overrides refresh_interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file populated with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (file + environment)
    Show,

    /// Set a configuration value in the config file
    Set {
        /// Config key, e.g. "ping_target" or "router_good"
        key: String,

        /// Value to set
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
