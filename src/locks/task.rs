//! Reentrant locks for async tasks, keyed by canonical path.
//!
//! Waiting suspends the task rather than blocking a runtime worker. Waiters
//! are served in FIFO order through a single-permit tokio semaphore.
//!
//! Reentrancy follows scopes, not task ids: one tokio task may poll many
//! independent futures (`join!`, `FuturesUnordered`), and each of them must
//! queue for the lock. Only code running inside [`TaskLockGuard::scope`]
//! re-enters the lock that guard holds.

use super::registry::LockRegistry;
use super::wait::LockWait;
use crate::error::{AtomfileError, Result};
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

static TASK_LOCKS: LazyLock<LockRegistry<TaskLock>> = LazyLock::new(LockRegistry::new);

/// The process-wide registry of per-path task locks.
pub fn task_locks() -> &'static LockRegistry<TaskLock> {
    &TASK_LOCKS
}

tokio::task_local! {
    // Locks held by the enclosing `scope` calls, innermost last.
    static HELD: Vec<Arc<TaskLock>>;
}

fn held_in_scope(lock: &Arc<TaskLock>) -> bool {
    HELD.try_with(|held| held.iter().any(|h| Arc::ptr_eq(h, lock)))
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct TaskState {
    depth: usize,
    permit: Option<OwnedSemaphorePermit>,
}

/// A reentrant, suspending lock for async tasks.
#[derive(Debug)]
pub struct TaskLock {
    permits: Arc<Semaphore>,
    state: Mutex<TaskState>,
}

impl Default for TaskLock {
    fn default() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            state: Mutex::new(TaskState::default()),
        }
    }
}

impl TaskLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the lock.
    ///
    /// Inside the [`scope`](TaskLockGuard::scope) of a guard for this lock the
    /// call re-enters immediately; everywhere else it queues behind the
    /// current holder. `path` only labels errors.
    pub async fn acquire(self: &Arc<Self>, path: &Path, wait: LockWait) -> Result<TaskLockGuard> {
        if held_in_scope(self) {
            let mut state = self.state();
            if state.depth > 0 {
                state.depth += 1;
                tracing::trace!(path = %path.display(), depth = state.depth, "re-entered task lock");
                return Ok(self.guard(false));
            }
        }

        let permits = Arc::clone(&self.permits);
        let permit = match wait {
            LockWait::Blocking => permits
                .acquire_owned()
                .await
                .map_err(|_| closed_error(path))?,
            LockWait::NonBlocking => match permits.try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => return Err(timeout_error(path, wait)),
                Err(TryAcquireError::Closed) => return Err(closed_error(path)),
            },
            LockWait::Timeout(limit) => {
                match tokio::time::timeout(limit, permits.acquire_owned()).await {
                    Ok(acquired) => acquired.map_err(|_| closed_error(path))?,
                    Err(_) => return Err(timeout_error(path, wait)),
                }
            }
        };

        let mut state = self.state();
        state.depth = 1;
        state.permit = Some(permit);
        tracing::trace!(path = %path.display(), "acquired task lock");
        Ok(self.guard(true))
    }

    fn guard(self: &Arc<Self>, outermost: bool) -> TaskLockGuard {
        TaskLockGuard {
            lock: Arc::clone(self),
            outermost,
        }
    }

    fn release(&self) {
        let permit = {
            let mut state = self.state();
            state.depth = state.depth.saturating_sub(1);
            if state.depth > 0 {
                return;
            }
            state.permit.take()
        };
        drop(permit);
    }

    /// Whether any holder currently owns the lock.
    pub fn is_locked(&self) -> bool {
        self.state().depth > 0
    }
}

fn timeout_error(path: &Path, wait: LockWait) -> AtomfileError {
    AtomfileError::LockTimeout {
        path: path.to_path_buf(),
        timeout: wait.reported_timeout(),
    }
}

fn closed_error(path: &Path) -> AtomfileError {
    AtomfileError::Lock {
        path: path.to_path_buf(),
        source: io::Error::other("task lock semaphore closed"),
    }
}

/// RAII guard for a [`TaskLock`] acquisition. Safe to hold across `.await`.
#[derive(Debug)]
pub struct TaskLockGuard {
    lock: Arc<TaskLock>,
    outermost: bool,
}

impl TaskLockGuard {
    /// Whether this acquisition took the lock, as opposed to re-entering it.
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }

    /// Run `fut` as part of this guard's critical section.
    ///
    /// Acquisitions of the same lock made while `fut` runs re-enter instead
    /// of waiting. Futures running beside `fut` in the same task get no such
    /// pass.
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        let mut held = HELD.try_with(|held| held.clone()).unwrap_or_default();
        held.push(Arc::clone(&self.lock));
        HELD.scope(held, fut).await
    }
}

impl Drop for TaskLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}
