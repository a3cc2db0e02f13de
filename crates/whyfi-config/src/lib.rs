//! Configuration for the whyfi CLI.
//!
//! A flat TOML file plus `WHYFI_*` environment overrides, layered over
//! built-in defaults and translated into `whyfi_core::MonitorConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use whyfi_core::{
    CommandPaths, CoreError, MonitorConfig, SignalThresholds, Thresholds, Tiers,
};

/// Prefix for environment overrides, e.g. `WHYFI_PING_TARGET`.
pub const ENV_PREFIX: &str = "WHYFI_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<CoreError> for ConfigError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { field, reason } => Self::Validation { field, reason },
        }
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// Flat key/value configuration. Durations are whole seconds, latency
/// thresholds milliseconds, loss thresholds percent, signal thresholds dBm.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ping_target: String,
    pub ping_count: u32,
    pub dns_test_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_server: Option<String>,

    pub ping_timeout: u64,
    pub dns_timeout: u64,
    pub speed_test_timeout: u64,
    pub refresh_interval: u64,
    pub history_capacity: usize,

    pub router_excellent: f64,
    pub router_good: f64,
    pub router_fair: f64,
    pub internet_excellent: f64,
    pub internet_good: f64,
    pub internet_fair: f64,
    pub dns_excellent: f64,
    pub dns_good: f64,
    pub dns_fair: f64,
    pub jitter_excellent: f64,
    pub jitter_good: f64,
    pub jitter_fair: f64,
    pub loss_excellent: f64,
    pub loss_good: f64,
    pub loss_fair: f64,
    pub signal_excellent: i32,
    pub signal_good: i32,
    pub signal_fair: i32,

    pub ping_command: String,
    pub dig_command: String,
    pub speed_test_command: String,
    pub route_command: String,
}

impl Default for Config {
    fn default() -> Self {
        let monitor = MonitorConfig::default();
        let t = &monitor.thresholds;
        Self {
            ping_target: monitor.ping_target.clone(),
            ping_count: monitor.ping_count,
            dns_test_domain: monitor.dns_test_domain.clone(),
            dns_server: None,
            ping_timeout: monitor.ping_timeout.as_secs(),
            dns_timeout: monitor.dns_timeout.as_secs(),
            speed_test_timeout: monitor.speed_test_timeout.as_secs(),
            refresh_interval: monitor.refresh_interval.as_secs(),
            history_capacity: monitor.history_capacity,
            router_excellent: t.router.excellent,
            router_good: t.router.good,
            router_fair: t.router.fair,
            internet_excellent: t.internet.excellent,
            internet_good: t.internet.good,
            internet_fair: t.internet.fair,
            dns_excellent: t.dns.excellent,
            dns_good: t.dns.good,
            dns_fair: t.dns.fair,
            jitter_excellent: t.jitter.excellent,
            jitter_good: t.jitter.good,
            jitter_fair: t.jitter.fair,
            loss_excellent: t.loss.excellent,
            loss_good: t.loss.good,
            loss_fair: t.loss.fair,
            signal_excellent: t.signal.excellent,
            signal_good: t.signal.good,
            signal_fair: t.signal.fair,
            ping_command: monitor.commands.ping.clone(),
            dig_command: monitor.commands.dig.clone(),
            speed_test_command: monitor.commands.speed_test.clone(),
            route_command: monitor.commands.route.clone(),
        }
    }
}

impl Config {
    /// Translate to the core's runtime configuration, validating it.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let config = MonitorConfig {
            ping_target: self.ping_target.clone(),
            ping_count: self.ping_count,
            dns_test_domain: self.dns_test_domain.clone(),
            dns_server: self
                .dns_server
                .as_ref()
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            ping_timeout: Duration::from_secs(self.ping_timeout),
            dns_timeout: Duration::from_secs(self.dns_timeout),
            speed_test_timeout: Duration::from_secs(self.speed_test_timeout),
            refresh_interval: Duration::from_secs(self.refresh_interval),
            history_capacity: self.history_capacity,
            thresholds: Thresholds {
                router: Tiers::new(self.router_excellent, self.router_good, self.router_fair),
                internet: Tiers::new(
                    self.internet_excellent,
                    self.internet_good,
                    self.internet_fair,
                ),
                dns: Tiers::new(self.dns_excellent, self.dns_good, self.dns_fair),
                jitter: Tiers::new(self.jitter_excellent, self.jitter_good, self.jitter_fair),
                loss: Tiers::new(self.loss_excellent, self.loss_good, self.loss_fair),
                signal: SignalThresholds {
                    excellent: self.signal_excellent,
                    good: self.signal_good,
                    fair: self.signal_fair,
                },
            },
            commands: CommandPaths {
                ping: self.ping_command.clone(),
                dig: self.dig_command.clone(),
                speed_test: self.speed_test_command.clone(),
                route: self.route_command.clone(),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "whyfi", "whyfi").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("whyfi");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load and validate the config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.to_monitor_config()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
