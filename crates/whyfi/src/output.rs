//! Output formatting: tables and JSON.
//!
//! Detail views use `tabled`, JSON serializes the underlying data via serde.
//! Colors come from `owo-colors` and are applied only when enabled.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use whyfi_core::{ProbeResult, Quality, Severity, SignalQuality};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Applies the palette, or passes text through untouched.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    pub fn severity(self, severity: Severity) -> String {
        let label = severity.to_string();
        if !self.enabled {
            return label;
        }
        match severity {
            Severity::Critical => label.red().bold().to_string(),
            Severity::Warning => label.yellow().to_string(),
            Severity::Info => label.cyan().to_string(),
        }
    }

    pub fn quality(self, quality: Quality) -> String {
        let label = quality.to_string();
        if !self.enabled {
            return label;
        }
        match quality {
            Quality::Excellent | Quality::Good => label.green().to_string(),
            Quality::Fair => label.yellow().to_string(),
            Quality::Poor => label.red().to_string(),
        }
    }

    pub fn signal(self, quality: SignalQuality) -> String {
        let label = quality.to_string();
        if !self.enabled {
            return label;
        }
        match quality {
            SignalQuality::Excellent | SignalQuality::Good => label.green().to_string(),
            SignalQuality::Fair => label.yellow().to_string(),
            SignalQuality::Poor | SignalQuality::NoSignal => label.red().to_string(),
        }
    }

    pub fn heading(self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn warn(self, text: &str) -> String {
        if self.enabled {
            text.yellow().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn dim(self, text: &str) -> String {
        if self.enabled {
            text.dimmed().to_string()
        } else {
            text.to_owned()
        }
    }
}

// ── Value formatting ─────────────────────────────────────────────────

pub fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |ms| format!("{ms:.1} ms"))
}

pub fn fmt_percent(value: f64) -> String {
    format!("{value:.0}%")
}

pub fn fmt_probe(result: &ProbeResult) -> String {
    match result {
        ProbeResult::Unknown => "-".into(),
        ProbeResult::Success { latency_ms } => format!("{latency_ms:.1} ms"),
        ProbeResult::Timeout => "timeout".into(),
        ProbeResult::Error { message } => message.clone(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single item. Table output uses a pre-formatted `detail_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Two-column key/value table for detail views.
pub fn render_pairs(pairs: &[(&str, String)]) -> String {
    let mut builder = tabled::builder::Builder::default();
    for (key, value) in pairs {
        builder.push_record([(*key).to_owned(), value.clone()]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn render_json<T: serde::Serialize + ?Sized>(
    data: &T,
    compact: bool,
) -> Result<String, CliError> {
    let json = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(json)
}
