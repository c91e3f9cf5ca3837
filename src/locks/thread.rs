//! Reentrant, thread-scoped locks keyed by canonical path.

use super::registry::LockRegistry;
use super::wait::LockWait;
use crate::error::{AtomfileError, Result};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Condvar, LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Instant;

static THREAD_LOCKS: LazyLock<LockRegistry<ThreadLock>> = LazyLock::new(LockRegistry::new);

/// The process-wide registry of per-path thread locks.
pub fn thread_locks() -> &'static LockRegistry<ThreadLock> {
    &THREAD_LOCKS
}

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
}

/// A reentrant mutex owned by one thread at a time.
///
/// The owning thread may acquire it again without blocking; it becomes free
/// once every guard the owner obtained has been dropped.
#[derive(Debug, Default)]
pub struct ThreadLock {
    state: Mutex<Ownership>,
    released: Condvar,
}

impl ThreadLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Ownership> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the lock for the current thread.
    ///
    /// `path` only labels the timeout error.
    pub fn acquire(self: &Arc<Self>, path: &Path, wait: LockWait) -> Result<ThreadLockGuard> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.owner == Some(me) {
            state.depth += 1;
            tracing::trace!(path = %path.display(), depth = state.depth, "re-entered thread lock");
            return Ok(self.guard(false));
        }

        let deadline = match wait {
            LockWait::Timeout(d) => Instant::now().checked_add(d),
            _ => None,
        };

        while state.owner.is_some() {
            state = match (wait, deadline) {
                (LockWait::NonBlocking, _) => return Err(timeout_error(path, wait)),
                (LockWait::Timeout(_), Some(at)) => {
                    let left = at.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Err(timeout_error(path, wait));
                    }
                    self.released
                        .wait_timeout(state, left)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                _ => self
                    .released
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }

        state.owner = Some(me);
        state.depth = 1;
        tracing::trace!(path = %path.display(), "acquired thread lock");
        Ok(self.guard(true))
    }

    fn guard(self: &Arc<Self>, outermost: bool) -> ThreadLockGuard {
        ThreadLockGuard {
            lock: Arc::clone(self),
            outermost,
            _not_send: PhantomData,
        }
    }

    fn release(&self) {
        let mut state = self.state();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.released.notify_all();
        }
    }

    /// Whether any thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.state().owner.is_some()
    }
}

fn timeout_error(path: &Path, wait: LockWait) -> AtomfileError {
    AtomfileError::LockTimeout {
        path: path.to_path_buf(),
        timeout: wait.reported_timeout(),
    }
}

/// RAII guard for a [`ThreadLock`] acquisition.
///
/// Must be dropped on the thread that acquired it, so it is `!Send`.
#[derive(Debug)]
pub struct ThreadLockGuard {
    lock: Arc<ThreadLock>,
    outermost: bool,
    _not_send: PhantomData<*const ()>,
}

impl ThreadLockGuard {
    /// Whether this acquisition took the lock, as opposed to re-entering it.
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for ThreadLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn path() -> &'static Path {
        Path::new("/virtual/thread-lock.json")
    }

    #[test]
    fn test_reentrant_acquisition() {
        let lock = Arc::new(ThreadLock::new());

        let outer = lock.acquire(path(), LockWait::NonBlocking).unwrap();
        let inner = lock.acquire(path(), LockWait::NonBlocking).unwrap();
        assert!(outer.is_outermost());
        assert!(!inner.is_outermost());

        drop(inner);
        assert!(lock.is_locked());
        drop(outer);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_released_only_after_outer_scope() {
        let lock = Arc::new(ThreadLock::new());
        let outer = lock.acquire(path(), LockWait::Blocking).unwrap();
        let inner = lock.acquire(path(), LockWait::Blocking).unwrap();
        drop(inner);

        let contender = Arc::clone(&lock);
        let attempt = thread::spawn(move || {
            contender
                .acquire(path(), LockWait::NonBlocking)
                .map(|_| ())
                .map_err(|e| e.is_lock_timeout())
        })
        .join()
        .unwrap();
        assert_eq!(attempt, Err(true));

        drop(outer);
        let contender = Arc::clone(&lock);
        let attempt = thread::spawn(move || contender.acquire(path(), LockWait::NonBlocking).is_ok())
            .join()
            .unwrap();
        assert!(attempt);
    }

    #[test]
    fn test_timeout_elapses_then_fails() {
        let lock = Arc::new(ThreadLock::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder_lock = Arc::clone(&lock);
        let holder = thread::spawn(move || {
            let _guard = holder_lock.acquire(path(), LockWait::Blocking).unwrap();
            held_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        });
        held_rx.recv().unwrap();

        let start = Instant::now();
        let result = lock.acquire(path(), LockWait::Timeout(Duration::from_millis(200)));
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(AtomfileError::LockTimeout { .. })));
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(2));

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let lock = Arc::new(ThreadLock::new());
        let barrier = Arc::new(Barrier::new(2));

        let holder_lock = Arc::clone(&lock);
        let holder_barrier = Arc::clone(&barrier);
        let holder = thread::spawn(move || {
            let _guard = holder_lock.acquire(path(), LockWait::Blocking).unwrap();
            holder_barrier.wait();
            thread::sleep(Duration::from_millis(100));
        });

        barrier.wait();
        let guard = lock.acquire(path(), LockWait::Timeout(Duration::from_secs(5)));
        assert!(guard.is_ok());
        holder.join().unwrap();
    }

    #[test]
    fn test_never_two_holders() {
        let lock = Arc::new(ThreadLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let entries = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                let entries = Arc::clone(&entries);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock.acquire(path(), LockWait::Blocking).unwrap();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        entries.fetch_add(1, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(entries.load(Ordering::SeqCst), 400);
    }

    #[test]
    fn test_global_registry_shares_locks() {
        let a = thread_locks().get(Path::new("/virtual/registry-shared.json"));
        let b = thread_locks().get(Path::new("/virtual/registry-shared.json"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
