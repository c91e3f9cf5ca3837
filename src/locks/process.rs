//! Inter-process advisory locks on `<target>.lock` marker files.
//!
//! The marker is only a rendezvous point: its existence means nothing, and it
//! is never removed. Ownership is the OS advisory lock taken through `fs2`.
//! While a lock is held the marker carries [`LockMetadata`] about the holder.
//!
//! Advisory locks conflict between distinct open handles even inside one
//! process, so a thread that already holds a marker must not lock it again.
//! [`acquire_for_thread`] keeps a per-thread table of held markers for that.

use super::metadata::LockMetadata;
use super::wait::LockWait;
use crate::error::{AtomfileError, Result};
use fs2::FileExt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MIN_BACKOFF: Duration = Duration::from_millis(1);
const MAX_BACKOFF: Duration = Duration::from_millis(50);

/// An exclusive advisory lock on a marker file.
///
/// Each acquisition opens its own handle; dropping the lock unlocks and
/// closes it.
#[derive(Debug)]
pub struct ProcessLock {
    file: File,
    marker: PathBuf,
}

impl ProcessLock {
    /// Acquire the lock on `marker`, creating the marker (and its parent
    /// directories) when missing.
    pub fn acquire(marker: &Path, wait: LockWait) -> Result<Self> {
        let file = open_marker(marker)?;

        match wait {
            LockWait::Blocking => {
                file.lock_exclusive().map_err(|e| lock_error(marker, e))?;
            }
            LockWait::NonBlocking => {
                if !try_lock(&file, marker)? {
                    return Err(timeout_error(marker, wait));
                }
            }
            LockWait::Timeout(timeout) => {
                let started = Instant::now();
                let mut backoff = MIN_BACKOFF;
                while !try_lock(&file, marker)? {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(timeout_error(marker, wait));
                    }
                    std::thread::sleep(backoff.min(timeout - elapsed));
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }

        let mut lock = Self {
            file,
            marker: marker.to_path_buf(),
        };
        if let Err(e) = lock.record_holder() {
            tracing::debug!(marker = %marker.display(), error = %e, "could not record lock holder");
        }
        tracing::debug!(marker = %marker.display(), "acquired process lock");
        Ok(lock)
    }

    /// Path of the marker file this lock is held on.
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    fn record_holder(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file
            .write_all(LockMetadata::current().to_json().as_bytes())?;
        self.file.flush()
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(marker = %self.marker.display(), error = %e, "failed to release process lock");
        } else {
            tracing::debug!(marker = %self.marker.display(), "released process lock");
        }
    }
}

fn open_marker(marker: &Path) -> Result<File> {
    if let Some(parent) = marker.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| lock_error(marker, e))?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(marker)
        .map_err(|e| lock_error(marker, e))
}

/// One non-blocking attempt. `Ok(false)` means another handle holds the lock.
fn try_lock(file: &File, marker: &Path) -> Result<bool> {
    match file.try_lock_exclusive() {
        Ok(()) => Ok(true),
        Err(e) if is_contended(&e) => Ok(false),
        Err(e) => Err(lock_error(marker, e)),
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn lock_error(marker: &Path, source: io::Error) -> AtomfileError {
    AtomfileError::Lock {
        path: marker.to_path_buf(),
        source,
    }
}

fn timeout_error(marker: &Path, wait: LockWait) -> AtomfileError {
    AtomfileError::LockTimeout {
        path: marker.to_path_buf(),
        timeout: wait.reported_timeout(),
    }
}

/// Observed state of a process lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    /// Nobody holds the lock (or the marker does not exist).
    Free,
    /// Some handle holds the lock; metadata is present when the holder
    /// recorded it and it could be parsed.
    Held(Option<LockMetadata>),
}

impl LockStatus {
    pub fn is_held(&self) -> bool {
        matches!(self, LockStatus::Held(_))
    }
}

/// Report whether `marker` is currently locked, without waiting.
///
/// A lock held by this very process through another handle reports as held.
pub fn inspect(marker: &Path) -> Result<LockStatus> {
    let file = match File::open(marker) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LockStatus::Free),
        Err(e) => return Err(lock_error(marker, e)),
    };

    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            Ok(LockStatus::Free)
        }
        Err(e) if is_contended(&e) => {
            let mut raw = String::new();
            let metadata = (&file)
                .read_to_string(&mut raw)
                .ok()
                .and_then(|_| LockMetadata::parse(&raw));
            Ok(LockStatus::Held(metadata))
        }
        Err(e) => Err(lock_error(marker, e)),
    }
}

struct HeldEntry {
    _lock: ProcessLock,
    depth: usize,
}

thread_local! {
    static HELD: RefCell<HashMap<PathBuf, HeldEntry>> = RefCell::new(HashMap::new());
}

/// Acquire `marker` for the current thread, reusing the lock if this thread
/// already holds it.
///
/// The lock is released when the last guard for the marker on this thread is
/// dropped.
pub fn acquire_for_thread(marker: &Path, wait: LockWait) -> Result<ThreadProcessGuard> {
    let reentered = HELD.with(|held| match held.borrow_mut().get_mut(marker) {
        Some(entry) => {
            entry.depth += 1;
            true
        }
        None => false,
    });

    if !reentered {
        let lock = ProcessLock::acquire(marker, wait)?;
        HELD.with(|held| {
            held.borrow_mut()
                .insert(marker.to_path_buf(), HeldEntry { _lock: lock, depth: 1 });
        });
    }

    Ok(ThreadProcessGuard {
        marker: marker.to_path_buf(),
        outermost: !reentered,
        _not_send: PhantomData,
    })
}

/// Whether the current thread holds the process lock on `marker`.
pub fn held_by_current_thread(marker: &Path) -> bool {
    HELD.with(|held| held.borrow().contains_key(marker))
}

/// A thread's share of a process lock acquired with [`acquire_for_thread`].
#[derive(Debug)]
pub struct ThreadProcessGuard {
    marker: PathBuf,
    outermost: bool,
    _not_send: PhantomData<*const ()>,
}

impl ThreadProcessGuard {
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for ThreadProcessGuard {
    fn drop(&mut self) {
        let released = HELD.try_with(|held| {
            let mut held = held.borrow_mut();
            let depth = match held.get_mut(&self.marker) {
                Some(entry) => {
                    entry.depth -= 1;
                    entry.depth
                }
                None => return None,
            };
            if depth == 0 { held.remove(&self.marker) } else { None }
        });
        // The entry (and with it the OS lock) is dropped here, outside the borrow.
        drop(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use tempfile::TempDir;

    fn marker(temp: &TempDir) -> PathBuf {
        temp.path().join("data.json.lock")
    }

    #[test]
    fn test_acquire_creates_marker_and_records_holder() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);

        let lock = ProcessLock::acquire(&marker, LockWait::NonBlocking).unwrap();
        assert_eq!(lock.marker(), marker.as_path());

        let raw = fs::read_to_string(&marker).unwrap();
        let meta = LockMetadata::parse(&raw).unwrap();
        assert_eq!(meta.pid, Some(std::process::id()));
    }

    #[test]
    fn test_marker_survives_release() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);

        drop(ProcessLock::acquire(&marker, LockWait::Blocking).unwrap());
        assert!(marker.exists());
        assert_eq!(inspect(&marker).unwrap(), LockStatus::Free);
    }

    #[test]
    fn test_second_handle_is_refused() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);

        let _held = ProcessLock::acquire(&marker, LockWait::Blocking).unwrap();
        let err = ProcessLock::acquire(&marker, LockWait::NonBlocking).unwrap_err();
        match err {
            AtomfileError::LockTimeout { timeout, .. } => assert_eq!(timeout, Duration::ZERO),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timed_wait_fails_after_timeout() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);
        let _held = ProcessLock::acquire(&marker, LockWait::Blocking).unwrap();

        let started = Instant::now();
        let err = ProcessLock::acquire(&marker, LockWait::Timeout(Duration::from_millis(150)))
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(err.is_lock_timeout());
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_timed_wait_succeeds_once_released() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);
        let (tx, rx) = mpsc::channel();

        let holder_marker = marker.clone();
        let holder = thread::spawn(move || {
            let _lock = ProcessLock::acquire(&holder_marker, LockWait::Blocking).unwrap();
            tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(100));
        });
        rx.recv().unwrap();

        let lock = ProcessLock::acquire(&marker, LockWait::Timeout(Duration::from_secs(5)));
        assert!(lock.is_ok());
        holder.join().unwrap();
    }

    #[test]
    fn test_repeated_acquire_release() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);
        for _ in 0..200 {
            drop(ProcessLock::acquire(&marker, LockWait::NonBlocking).unwrap());
        }
    }

    #[test]
    fn test_inspect_reports_holder() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);
        assert_eq!(inspect(&marker).unwrap(), LockStatus::Free);

        let _lock = ProcessLock::acquire(&marker, LockWait::Blocking).unwrap();
        match inspect(&marker).unwrap() {
            LockStatus::Held(Some(meta)) => assert_eq!(meta.pid, Some(std::process::id())),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_thread_table_reenters() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);

        let outer = acquire_for_thread(&marker, LockWait::NonBlocking).unwrap();
        let inner = acquire_for_thread(&marker, LockWait::NonBlocking).unwrap();
        assert!(outer.is_outermost());
        assert!(!inner.is_outermost());

        drop(inner);
        assert!(held_by_current_thread(&marker));
        assert!(inspect(&marker).unwrap().is_held());

        drop(outer);
        assert!(!held_by_current_thread(&marker));
        assert_eq!(inspect(&marker).unwrap(), LockStatus::Free);
    }

    #[test]
    fn test_thread_table_is_per_thread() {
        let temp = TempDir::new().unwrap();
        let marker = marker(&temp);
        let _guard = acquire_for_thread(&marker, LockWait::NonBlocking).unwrap();

        let other_marker = marker.clone();
        let refused = thread::spawn(move || {
            acquire_for_thread(&other_marker, LockWait::NonBlocking)
                .map(|_| ())
                .map_err(|e| e.is_lock_timeout())
        })
        .join()
        .unwrap();
        assert_eq!(refused, Err(true));
    }
}
