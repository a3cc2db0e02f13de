//! CLI error types with miette diagnostics.
//!
//! Maps config and core failures into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use whyfi_config::ConfigError;
use whyfi_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const UNHEALTHY: i32 = 4;
    pub const SPEED_TEST: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(whyfi::validation),
        help("Run: whyfi config show to see the resolved configuration")
    )]
    Validation { field: String, reason: String },

    #[error("Unknown config key '{key}'")]
    #[diagnostic(
        code(whyfi::unknown_key),
        help("Run: whyfi config show to list the available keys")
    )]
    UnknownKey { key: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(whyfi::config_exists),
        help("Use --force to overwrite it.\nPath: {path}")
    )]
    ConfigExists { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(whyfi::config),
        help("Check the config file syntax and WHYFI_* environment variables")
    )]
    Config(Box<figment::Error>),

    #[error("Could not parse config file: {0}")]
    #[diagnostic(code(whyfi::config_parse))]
    ConfigParse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    #[diagnostic(code(whyfi::config_serialize))]
    ConfigSerialize(#[from] toml::ser::Error),

    // ── Diagnosis ────────────────────────────────────────────────────

    #[error("{count} critical issue(s) found")]
    #[diagnostic(code(whyfi::unhealthy))]
    Unhealthy { count: usize },

    #[error("Speed test failed: {message}")]
    #[diagnostic(code(whyfi::speed_test))]
    SpeedTest { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(whyfi::io))]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    #[diagnostic(code(whyfi::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Serialization(e) => Self::ConfigSerialize(e),
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { field, reason } => Self::Validation { field, reason },
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::UnknownKey { .. } => exit_code::USAGE,
            Self::ConfigExists { .. }
            | Self::Config(_)
            | Self::ConfigParse(_)
            | Self::ConfigSerialize(_) => exit_code::CONFIG,
            Self::Unhealthy { .. } => exit_code::UNHEALTHY,
            Self::SpeedTest { .. } => exit_code::SPEED_TEST,
            Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}
