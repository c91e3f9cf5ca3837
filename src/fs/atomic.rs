//! Atomic filesystem writes.
//!
//! Every write path in atomfile goes through this module, so the target file
//! is never observed in a partial or corrupted state, even without any lock
//! held. Locks serialize logical read-modify-write sequences; atomicity of a
//! single write is this module's job.
//!
//! # Implementation Strategy
//!
//! All atomic writes follow this pattern:
//! 1. Create a uniquely named temporary file in the target's directory
//! 2. Write the full payload to it
//! 3. Flush and sync the file to disk (fsync)
//! 4. Atomically rename it onto the target
//!
//! Any failure along the way deletes the temporary file before the error is
//! returned.
//!
//! # Important Notes
//!
//! - The temporary file lives next to the target so the rename never crosses
//!   a filesystem boundary
//! - Temporary files are named `.{filename}.{random}.tmp`; a crash between
//!   steps 1 and 4 may leave one behind (see [`super::paths::find_stale_temporaries`])
//! - An existing target's permissions are carried over to the replacement

use crate::error::{AtomfileError, BoxError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Suffix shared by all temporary artifacts.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Atomically write bytes to a file.
///
/// # Example
///
/// ```no_run
/// use atomfile::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("config.yaml"), b"key: value\n")?;
/// # Ok::<(), atomfile::error::AtomfileError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    atomic_write_with(path, |sink| {
        sink.write_all(content)?;
        Ok(())
    })
}

/// Atomically write whatever `encode` streams into the provided sink.
///
/// The sink is buffered; `encode` may write in as many pieces as it likes.
/// An error from `encode` aborts the write and leaves the target untouched.
pub fn atomic_write_with<P, F>(path: P, encode: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> std::result::Result<(), BoxError>,
{
    let path = path.as_ref();

    // Ensure parent directory exists
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| AtomfileError::write(path, e))?;
    }

    let temp = create_temp(path, parent)?;
    tracing::trace!(temp = %temp.path().display(), path = %path.display(), "writing temporary file");

    // Dropping `temp` on any early return deletes the temporary file.
    let temp = write_and_sync(temp, encode).map_err(|e| AtomfileError::write(path, e))?;

    preserve_permissions(path, temp.as_file());

    temp.persist(path).map_err(|e| {
        // The PersistError still owns the temporary file; dropping it cleans up.
        AtomfileError::write(path, e.error)
    })?;

    sync_parent_dir(parent);
    tracing::debug!(path = %path.display(), "atomic write complete");

    Ok(())
}

/// Create a uniquely named temporary file next to the target.
fn create_temp(target: &Path, parent: &Path) -> Result<NamedTempFile> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AtomfileError::UserError(format!("invalid file path '{}'", target.display())))?;

    tempfile::Builder::new()
        .prefix(&format!(".{}.", filename))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| AtomfileError::write(target, e))
}

/// Stream the payload into the temporary file and sync it to disk.
fn write_and_sync<F>(temp: NamedTempFile, encode: F) -> std::result::Result<NamedTempFile, BoxError>
where
    F: FnOnce(&mut dyn Write) -> std::result::Result<(), BoxError>,
{
    let mut writer = BufWriter::new(temp);
    encode(&mut writer)?;
    writer.flush()?;
    let temp = writer.into_inner().map_err(|e| e.into_error())?;

    // Sync to disk to ensure durability before the rename publishes it
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Carry the existing target's permissions over to the replacement.
///
/// Best effort: new targets keep the temporary file's default mode.
fn preserve_permissions(target: &Path, temp: &File) {
    if let Ok(metadata) = fs::metadata(target)
        && let Err(e) = temp.set_permissions(metadata.permissions())
    {
        tracing::warn!(path = %target.display(), error = %e, "failed to preserve permissions");
    }
}

/// Sync the parent directory so the new directory entry is persisted.
#[cfg(unix)]
fn sync_parent_dir(parent: &Path) {
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_parent: &Path) {}
