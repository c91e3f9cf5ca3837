//! Append-only path → lock tables.
//!
//! Entries are created on the first acquisition attempt for a path and never
//! removed while the process lives. Removing an entry while another caller
//! still waits on it would let a later caller create a second, unrelated lock
//! for the same path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Registry of per-path locks of kind `L`.
///
/// The internal mutex is held only while looking up or inserting an entry,
/// never while a lock is held.
#[derive(Debug)]
pub struct LockRegistry<L> {
    entries: Mutex<HashMap<PathBuf, Arc<L>>>,
}

impl<L> Default for LockRegistry<L> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<L: Default> LockRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `canonical`, created on first use.
    pub fn get(&self, canonical: &Path) -> Arc<L> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = entries.get(canonical) {
            return Arc::clone(lock);
        }
        let lock = Arc::new(L::default());
        entries.insert(canonical.to_path_buf(), Arc::clone(&lock));
        lock
    }

    /// Number of paths that have ever been locked through this registry.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
