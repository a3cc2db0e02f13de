//! Config subcommand handlers.

use std::path::Path;

use whyfi_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::commands::config_path;
use crate::error::CliError;
use crate::output;

/// Keys that may be absent from a serialized default config.
const OPTIONAL_KEYS: &[&str] = &["dns_server"];

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_path(global);
    match &args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
        }

        ConfigCommand::Show => {
            let config = whyfi_config::load_config_from(&path)?;
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&config)?,
                OutputFormat::Json => output::render_json(&config, false)?,
                OutputFormat::JsonCompact => output::render_json(&config, true)?,
            };
            output::print_output(out.trim_end(), global.quiet);
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            whyfi_config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", path.display());
            }
        }

        ConfigCommand::Set { key, value } => {
            set_value(&path, key, value)?;
            if !global.quiet {
                eprintln!("Set {key} = {value} in {}", path.display());
            }
        }
    }
    Ok(())
}

// ── Set ─────────────────────────────────────────────────────────────

/// Update one key in the file at `path`, keeping the rest of it. The
/// value is typed after the key's default and the result must validate
/// before anything is written.
pub fn set_value(path: &Path, key: &str, raw: &str) -> Result<(), CliError> {
    let defaults = toml::Value::try_from(Config::default())?;
    let value = match defaults.get(key) {
        Some(default) => typed_value(key, raw, default)?,
        None if OPTIONAL_KEYS.contains(&key) => toml::Value::String(raw.to_owned()),
        None => return Err(CliError::UnknownKey { key: key.to_owned() }),
    };

    let mut table: toml::Table = if path.exists() {
        std::fs::read_to_string(path)?.parse()?
    } else {
        toml::Table::new()
    };
    table.insert(key.to_owned(), value);

    let candidate: Config = toml::Value::Table(table.clone()).try_into()?;
    candidate.to_monitor_config()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(&table)?)?;
    Ok(())
}

fn typed_value(key: &str, raw: &str, default: &toml::Value) -> Result<toml::Value, CliError> {
    let invalid = |expected: &str| CliError::Validation {
        field: key.to_owned(),
        reason: format!("expected {expected}, got '{raw}'"),
    };
    match default {
        toml::Value::Integer(_) => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| invalid("an integer")),
        toml::Value::Float(_) => raw
            .parse::<f64>()
            .map(toml::Value::Float)
            .map_err(|_| invalid("a number")),
        toml::Value::Boolean(_) => raw
            .parse::<bool>()
            .map(toml::Value::Boolean)
            .map_err(|_| invalid("true or false")),
        _ => Ok(toml::Value::String(raw.to_owned())),
    }
}
