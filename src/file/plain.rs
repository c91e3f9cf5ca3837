//! The plain facade: one process-wide lock for all files.

use super::sync::{self, LockedFile};
use super::Target;
use crate::codec::{self, Value};
use crate::config::Config;
use crate::error::Result;
use crate::locks::{LockWait, ThreadLock};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static GLOBAL_LOCK: LazyLock<Arc<ThreadLock>> = LazyLock::new(|| Arc::new(ThreadLock::new()));

/// Atomic, process-locked access to one file.
///
/// Within the process, all `SafeFile`s share a single reentrant lock, so
/// operations on different files also serialize. Use [`super::ThreadedSafeFile`]
/// when many threads work on different files.
#[derive(Debug, Clone)]
pub struct SafeFile {
    target: Target,
}

impl SafeFile {
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

    /// Open a facade using the timeout and marker suffix from `config`.
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        Ok(Self {
            target: Target::from_config(path.as_ref(), config)?,
        })
    }

    /// The canonical path of the file.
    pub fn path(&self) -> &Path {
        self.target.path()
    }

    /// Path of the process-lock marker.
    pub fn lock_path(&self) -> &Path {
        self.target.marker()
    }

    /// Decode the file, or `None` if it does not exist.
    pub fn read(&self) -> Result<Option<Value>> {
        self.locked()?.read()
    }

    /// Encode and atomically replace the file.
    pub fn write(&self, value: &Value) -> Result<()> {
        self.locked()?.write(value)
    }

    /// Read, shallow-merge, and write under one lock acquisition.
    pub fn update(&self, value: Value) -> Result<Value> {
        self.locked()?.update(value)
    }

    /// Append text. Not atomic, but serialized with every other operation.
    pub fn append(&self, text: &str) -> Result<()> {
        self.locked()?.append(text)
    }

    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.locked()?.read_bytes()
    }

    pub fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.locked()?.write_bytes(data)
    }

    /// Hold both locks until the returned guard is dropped.
    pub fn locked(&self) -> Result<LockedFile<'_>> {
        sync::lock(&self.target, &GLOBAL_LOCK)
    }

    /// Extensions with a registered codec, sorted.
    pub fn supported_formats() -> Vec<String> {
        codec::supported_formats()
    }
}
