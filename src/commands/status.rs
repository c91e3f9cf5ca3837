//! Implementation of the `atomfile status` command.
//!
//! Reports the state of a file's process lock without waiting for it.

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::Result;
use crate::fs::{canonical_path, lock_marker_path};
use crate::locks::{LockStatus, inspect};

/// Execute the `atomfile status` command.
pub fn cmd_status(args: StatusArgs, config: &Config) -> Result<()> {
    let path = canonical_path(&args.file)?;
    let marker = lock_marker_path(&path, &config.lock_suffix);
    let status = inspect(&marker)?;

    println!("File:   {}", path.display());
    println!("Marker: {}", marker.display());
    println!("Lock:   {}", describe(&status));
    Ok(())
}

/// One-line description of a lock status.
pub(crate) fn describe(status: &LockStatus) -> String {
    match status {
        LockStatus::Free => "free".to_string(),
        LockStatus::Held(Some(meta)) => format!("held by {}", meta),
        LockStatus::Held(None) => "held (holder unknown)".to_string(),
    }
}
