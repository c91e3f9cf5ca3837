//! Command implementations for atomfile.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the helpers shared by several of them.

mod append;
mod formats;
mod read;
mod stale;
mod status;
mod update;
mod write;


use crate::cli::{Cli, Command, LockOptions};
use crate::codec::Value;
use crate::config::Config;
use crate::error::Result;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. The effective
/// config is resolved once from `--config` and the lock options, then
/// handed to the handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli.lock)?;

    match cli.command {
        Command::Read(args) => read::cmd_read(args, &config),
        Command::Write(args) => write::cmd_write(args, &config),
        Command::Update(args) => update::cmd_update(args, &config),
        Command::Append(args) => append::cmd_append(args, &config),
        Command::Formats => formats::cmd_formats(),
        Command::Status(args) => status::cmd_status(args, &config),
        Command::Stale(args) => stale::cmd_stale(args),
    }
}

/// Build the effective config: file (or defaults), then command-line overrides.
pub(crate) fn resolve_config(options: &LockOptions) -> Result<Config> {
    let mut config = match &options.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if options.block {
        config.lock_timeout_secs = None;
    } else if let Some(secs) = options.timeout {
        config.lock_timeout_secs = Some(secs);
    }

    config.validate()?;
    Ok(config)
}

/// Interpret command-line data as JSON, falling back to a plain string.
pub(crate) fn parse_data(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Render a value for the terminal.
///
/// Mappings and sequences print as indented JSON, strings verbatim, and an
/// absent or null value as nothing.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        scalar => scalar.to_string(),
    }
}
