//! Implementation of the `atomfile read` command.

use super::render_value;
use crate::cli::ReadArgs;
use crate::config::Config;
use crate::error::{AtomfileError, Result};
use crate::file::SafeFile;
use std::io::Write;

/// Execute the `atomfile read` command.
///
/// A missing file is a user error here, unlike in the library where it
/// reads as `None`.
pub fn cmd_read(args: ReadArgs, config: &Config) -> Result<()> {
    if !args.file.exists() {
        return Err(AtomfileError::UserError(format!(
            "file not found: '{}'",
            args.file.display()
        )));
    }

    let file = SafeFile::with_config(&args.file, config)?;

    if args.as_bytes {
        let data = file.read_bytes()?.unwrap_or_default();
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&data)
            .and_then(|()| stdout.flush())
            .map_err(|e| AtomfileError::UserError(format!("failed to write to stdout: {}", e)))?;
        return Ok(());
    }

    let value = file.read()?.unwrap_or_default();
    println!("{}", render_value(&value));
    Ok(())
}
