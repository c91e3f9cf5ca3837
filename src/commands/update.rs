//! Implementation of the `atomfile update` command.

use super::render_value;
use crate::cli::UpdateArgs;
use crate::config::Config;
use crate::error::{AtomfileError, Result};
use crate::file::SafeFile;

/// Execute the `atomfile update` command.
///
/// The argument must be valid JSON. A mapping is merged key by key into
/// the stored mapping; anything else replaces the content. The resulting
/// value is printed.
pub fn cmd_update(args: UpdateArgs, config: &Config) -> Result<()> {
    let patch = serde_json::from_str(&args.json).map_err(|e| {
        AtomfileError::UserError(format!("update data must be valid JSON: {}", e))
    })?;

    let file = SafeFile::with_config(&args.file, config)?;
    let written = file.update(patch)?;

    println!("{}", render_value(&written));
    Ok(())
}
