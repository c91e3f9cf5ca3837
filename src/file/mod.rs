//! Safe file facades.
//!
//! Three variants share one set of operations and differ only in the
//! in-process lock they take before the process lock:
//!
//! | Variant              | In-process lock                         |
//! |----------------------|-----------------------------------------|
//! | [`SafeFile`]         | one process-wide reentrant thread lock  |
//! | [`ThreadedSafeFile`] | per-path reentrant thread lock          |
//! | [`AsyncSafeFile`]    | per-path reentrant task lock            |
//!
//! Every single operation takes both locks, does its work, and releases
//! them. `locked()` holds both for a whole sequence of operations; single
//! operations issued from inside that scope re-enter the held locks.
//!
//! The path a facade is built from is canonicalized once at construction.
//! All I/O and lock keys use the canonical path.

mod async_file;
mod ops;
mod plain;
mod sync;
mod threaded;


pub use async_file::{AsyncLockedFile, AsyncSafeFile};
pub use plain::SafeFile;
pub use sync::LockedFile;
pub use threaded::ThreadedSafeFile;

use crate::config::Config;
use crate::error::{AtomfileError, Result};
use crate::fs::paths::{DEFAULT_LOCK_SUFFIX, canonical_path, lock_marker_path};
use crate::locks::LockWait;
use std::path::{Path, PathBuf};

/// Where a facade reads and writes, and how it locks.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    path: PathBuf,
    marker: PathBuf,
    wait: LockWait,
}

impl Target {
    pub(crate) fn new(path: &Path, wait: LockWait, lock_suffix: &str) -> Result<Self> {
        let path = canonical_path(path)?;
        let marker = lock_marker_path(&path, lock_suffix);
        Ok(Self { path, marker, wait })
    }

    pub(crate) fn with_wait(path: &Path, wait: LockWait) -> Result<Self> {
        Self::new(path, wait, DEFAULT_LOCK_SUFFIX)
    }

    pub(crate) fn from_config(path: &Path, config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(path, config.lock_wait(), &config.lock_suffix)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn marker(&self) -> &Path {
        &self.marker
    }

    /// Report lock timeouts against the target with the configured timeout,
    /// whichever lock or remaining budget actually ran out.
    pub(crate) fn relabel(&self, err: AtomfileError) -> AtomfileError {
        match err {
            AtomfileError::LockTimeout { .. } => AtomfileError::LockTimeout {
                path: self.path.clone(),
                timeout: self.wait.reported_timeout(),
            },
            other => other,
        }
    }
}
