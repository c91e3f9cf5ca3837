//! The thread-coordinated facade: one reentrant lock per canonical path.

use super::Target;
use super::sync::{self, LockedFile};
use crate::codec::{self, Value};
use crate::config::Config;
use crate::error::Result;
use crate::locks::{LockWait, thread_locks};
use std::path::Path;
use std::time::Duration;

/// Atomic access to one file, safe to share among many threads.
///
/// Threads working on different files never contend. Any number of
/// `ThreadedSafeFile`s (and `SafeFile`s) may point at the same file; they
/// coordinate through the per-path lock registry and the process lock.
///
/// # Example
///
/// ```no_run
/// use atomfile::ThreadedSafeFile;
/// use serde_json::json;
///
/// let settings = ThreadedSafeFile::new("settings.yaml")?;
/// settings.write(&json!({ "theme": "dark" }))?;
/// let merged = settings.update(json!({ "font": 12 }))?;
/// assert_eq!(merged["theme"], "dark");
/// # Ok::<(), atomfile::AtomfileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ThreadedSafeFile {
    target: Target,
}

impl ThreadedSafeFile {
    /// Open a facade with the default 10 second lock timeout.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_wait(path, LockWait::default())
    }

    pub fn with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        Self::with_wait(path, LockWait::Timeout(timeout))
    }

    pub fn with_wait<P: AsRef<Path>>(path: P, wait: LockWait) -> Result<Self> {
        Ok(Self {
            target: Target::with_wait(path.as_ref(), wait)?,
        })
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        Ok(Self {
            target: Target::from_config(path.as_ref(), config)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn lock_path(&self) -> &Path {
        self.target.marker()
    }

    pub fn read(&self) -> Result<Option<Value>> {
        self.locked()?.read()
    }

    pub fn write(&self, value: &Value) -> Result<()> {
        self.locked()?.write(value)
    }

    /// Read, shallow-merge, and write under one lock acquisition.
    pub fn update(&self, value: Value) -> Result<Value> {
        self.locked()?.update(value)
    }

    pub fn append(&self, text: &str) -> Result<()> {
        self.locked()?.append(text)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.locked()?.read_bytes()
    }

    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.locked()?.write_bytes(data)
    }

    /// Hold this file's locks until the returned guard is dropped.
    pub fn locked(&self) -> Result<LockedFile<'_>> {
        let lock = thread_locks().get(self.target.path());
        sync::lock(&self.target, &lock)
    }

    pub fn supported_formats() -> Vec<String> {
        codec::supported_formats()
    }
}
