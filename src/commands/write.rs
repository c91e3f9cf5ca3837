//! Implementation of the `atomfile write` command.

use super::parse_data;
use crate::cli::WriteArgs;
use crate::config::Config;
use crate::error::{AtomfileError, Result};
use crate::file::SafeFile;

/// Execute the `atomfile write` command.
///
/// Unlike the library, the CLI requires the parent directory to exist.
pub fn cmd_write(args: WriteArgs, config: &Config) -> Result<()> {
    if let Some(parent) = args.file.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        return Err(AtomfileError::UserError(format!(
            "directory does not exist: '{}'",
            parent.display()
        )));
    }

    let file = SafeFile::with_config(&args.file, config)?;

    if args.as_bytes {
        file.write_bytes(args.data.as_bytes())?;
    } else {
        file.write(&parse_data(&args.data))?;
    }

    Ok(())
}
