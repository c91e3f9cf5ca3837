//! Lock acquisition and the locked scope for the thread-bound facades.

use super::{Target, ops};
use crate::codec::Value;
use crate::error::Result;
use crate::locks::{ThreadLock, ThreadLockGuard, ThreadProcessGuard, acquire_for_thread};
use std::path::Path;
use std::sync::Arc;

/// Take `inproc`, then the process lock, under one deadline.
///
/// If the process lock cannot be had, the in-process guard is dropped before
/// the error is returned.
pub(crate) fn lock<'a>(target: &'a Target, inproc: &Arc<ThreadLock>) -> Result<LockedFile<'a>> {
    let deadline = target.wait.start();

    let inproc = inproc
        .acquire(target.path(), deadline.remaining())
        .map_err(|e| target.relabel(e))?;
    let process = acquire_for_thread(target.marker(), deadline.remaining())
        .map_err(|e| target.relabel(e))?;

    if inproc.is_outermost() {
        tracing::debug!(path = %target.path().display(), "locked");
    }
    Ok(LockedFile {
        target,
        _process: process,
        _inproc: inproc,
    })
}

/// Both locks on one file, held until dropped.
///
/// Obtained from `SafeFile::locked` or `ThreadedSafeFile::locked`. All
/// operations on it run without re-acquiring anything. Bound to the thread
/// that created it.
///
/// # Example
///
/// ```no_run
/// use atomfile::ThreadedSafeFile;
///
/// let file = ThreadedSafeFile::new("counter.json")?;
/// let guard = file.locked()?;
/// let count = guard.read()?.and_then(|v| v["count"].as_i64()).unwrap_or(0);
/// guard.write(&serde_json::json!({ "count": count + 1 }))?;
/// # Ok::<(), atomfile::AtomfileError>(())
/// ```
#[derive(Debug)]
pub struct LockedFile<'a> {
    target: &'a Target,
    // Field order is drop order: the process lock goes first.
    _process: ThreadProcessGuard,
    _inproc: ThreadLockGuard,
}

impl LockedFile<'_> {
    pub fn path(&self) -> &Path {
        self.target.path()
    }

    /// Decode the file, or `None` if it does not exist.
    pub fn read(&self) -> Result<Option<Value>> {
        ops::read_value(self.target.path())
    }

    /// Encode and atomically replace the file.
    pub fn write(&self, value: &Value) -> Result<()> {
        ops::write_value(self.target.path(), value)
    }

    /// Shallow-merge `value` into the stored mapping and write the result.
    pub fn update(&self, value: Value) -> Result<Value> {
        ops::update_value(self.target.path(), value)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        ops::read_bytes(self.target.path())
    }

    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        ops::write_bytes(self.target.path(), data)
    }

    /// Append text to the file. Not atomic.
    pub fn append(&self, text: &str) -> Result<()> {
        ops::append_text(self.target.path(), text)
    }
}
