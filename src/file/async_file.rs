//! The task-coordinated facade for tokio.
//!
//! In-process coordination uses per-path task locks, which suspend the
//! waiting task. The process lock wait and all file I/O run on the blocking
//! pool so the runtime's workers never stall on the filesystem.

use super::{Target, ops};
use crate::codec::{self, Value};
use crate::config::Config;
use crate::error::{AtomfileError, Result};
use crate::locks::{LockWait, ProcessLock, TaskLockGuard, task_locks};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Atomic access to one file from async tasks.
///
/// # Example
///
/// ```no_run
/// use atomfile::AsyncSafeFile;
/// use serde_json::json;
///
/// # async fn run() -> atomfile::Result<()> {
/// let file = AsyncSafeFile::new("state.json")?;
/// let guard = file.locked().await?;
/// let mut state = guard.read().await?.unwrap_or_else(|| json!({}));
/// state["runs"] = json!(state["runs"].as_i64().unwrap_or(0) + 1);
/// guard.write(&state).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncSafeFile {
    target: Arc<Target>,
}

impl AsyncSafeFile {
    /// Open a facade with the default 10 second lock timeout.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_wait(path, LockWait::default())
    }

    pub fn with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        Self::with_wait(path, LockWait::Timeout(timeout))
    }

    pub fn with_wait<P: AsRef<Path>>(path: P, wait: LockWait) -> Result<Self> {
        Ok(Self {
            target: Arc::new(Target::with_wait(path.as_ref(), wait)?),
        })
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<Self> {
        Ok(Self {
            target: Arc::new(Target::from_config(path.as_ref(), config)?),
        })
    }

    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn lock_path(&self) -> &Path {
        self.target.marker()
    }

    pub async fn read(&self) -> Result<Option<Value>> {
        self.locked().await?.read().await
    }

    pub async fn write(&self, value: &Value) -> Result<()> {
        self.locked().await?.write(value).await
    }

    /// Read, shallow-merge, and write under one lock acquisition.
    pub async fn update(&self, value: Value) -> Result<Value> {
        self.locked().await?.update(value).await
    }

    pub async fn append(&self, text: &str) -> Result<()> {
        self.locked().await?.append(text).await
    }

    pub async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.locked().await?.read_bytes().await
    }

    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        self.locked().await?.write_bytes(data).await
    }

    /// Hold this file's locks until the returned guard is dropped.
    ///
    /// Calls made inside [`AsyncLockedFile::scope`] re-enter the held locks
    /// without touching the process lock again. Any other caller, including
    /// another future polled by the same task, waits its turn.
    pub async fn locked(&self) -> Result<AsyncLockedFile> {
        let target = Arc::clone(&self.target);
        let deadline = target.wait.start();

        let lock = task_locks().get(target.path());
        let inproc = lock
            .acquire(target.path(), deadline.remaining())
            .await
            .map_err(|e| target.relabel(e))?;

        let process = if inproc.is_outermost() {
            let marker = target.marker().to_path_buf();
            let wait = deadline.remaining();
            let acquired = on_blocking_pool(target.marker(), move || {
                ProcessLock::acquire(&marker, wait)
            })
            .await;
            // `inproc` is released by dropping it on the error path.
            let process = acquired.map_err(|e| target.relabel(e))?;
            tracing::debug!(path = %target.path().display(), "locked");
            Some(process)
        } else {
            None
        };

        Ok(AsyncLockedFile {
            target,
            _process: process,
            inproc,
        })
    }

    pub fn supported_formats() -> Vec<String> {
        codec::supported_formats()
    }
}

/// Both locks on one file, held until dropped. `Send`, so it may be held
/// across `.await` points on a multi-threaded runtime.
#[derive(Debug)]
pub struct AsyncLockedFile {
    target: Arc<Target>,
    // Field order is drop order: the process lock goes first.
    _process: Option<ProcessLock>,
    inproc: TaskLockGuard,
}

impl AsyncLockedFile {
    pub fn path(&self) -> &Path {
        self.target.path()
    }

    /// Run `fut` inside this guard's critical section, so facade calls on the
    /// same file made from it re-enter instead of waiting.
    ///
    /// ```no_run
    /// # async fn run() -> atomfile::Result<()> {
    /// let file = atomfile::AsyncSafeFile::new("state.json")?;
    /// let guard = file.locked().await?;
    /// guard
    ///     .scope(async {
    ///         file.update(serde_json::json!({ "step": 1 })).await?;
    ///         file.update(serde_json::json!({ "step": 2 })).await
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        self.inproc.scope(fut).await
    }

    fn owned_path(&self) -> PathBuf {
        self.target.path().to_path_buf()
    }

    pub async fn read(&self) -> Result<Option<Value>> {
        let path = self.owned_path();
        on_blocking_pool(self.path(), move || ops::read_value(&path)).await
    }

    pub async fn write(&self, value: &Value) -> Result<()> {
        let path = self.owned_path();
        let value = value.clone();
        on_blocking_pool(self.path(), move || ops::write_value(&path, &value)).await
    }

    pub async fn update(&self, value: Value) -> Result<Value> {
        let path = self.owned_path();
        on_blocking_pool(self.path(), move || ops::update_value(&path, value)).await
    }

    pub async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        let path = self.owned_path();
        on_blocking_pool(self.path(), move || ops::read_bytes(&path)).await
    }

    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        let path = self.owned_path();
        let data = data.to_vec();
        on_blocking_pool(self.path(), move || ops::write_bytes(&path, &data)).await
    }

    /// Append text to the file. Not atomic.
    pub async fn append(&self, text: &str) -> Result<()> {
        let path = self.owned_path();
        let text = text.to_string();
        on_blocking_pool(self.path(), move || ops::append_text(&path, &text)).await
    }
}

/// Run `work` on tokio's blocking pool.
///
/// A panic in `work` resumes on the caller; a runtime shutting down
/// underneath the call surfaces as a lock failure on `path`.
async fn on_blocking_pool<T, F>(path: &Path, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(AtomfileError::Lock {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        }),
    }
}
