//! Command handlers and the shared setup they need.

pub mod check;
pub mod config_cmd;
pub mod speedtest;
pub mod watch;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use whyfi_core::{Monitor, MonitorConfig, ProcessRunner};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::wifi::LinuxWifi;

/// The config file this invocation reads and writes.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(whyfi_config::config_path)
}

/// Resolve file + environment configuration into the monitor's settings.
pub fn load_monitor_config(global: &GlobalOpts) -> Result<MonitorConfig, CliError> {
    let config = whyfi_config::load_config_from(&config_path(global))?;
    Ok(config.to_monitor_config()?)
}

pub fn build_monitor(config: MonitorConfig) -> Result<Monitor, CliError> {
    let wifi = Arc::new(LinuxWifi::new(Arc::new(ProcessRunner::new())));
    Ok(Monitor::new(config, wifi)?)
}

/// Spinner on stderr; hidden when quiet or not attached to a terminal.
pub fn spinner(message: &'static str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
