//! Locking subsystem for atomfile.
//!
//! Three lock kinds cover the three concurrency domains:
//! - Process locks (`<target>.lock` markers, OS advisory locks via `fs2`)
//! - Thread locks (reentrant per thread, blocking)
//! - Task locks (reentrant within a guard scope, suspending)
//!
//! # Lock Order
//!
//! The in-process lock (thread or task) is always taken before the process
//! lock and released after it. Both kinds share one [`Deadline`] so the
//! configured timeout bounds the whole acquisition.
//!
//! # Registries
//!
//! Thread and task locks live in append-only registries keyed by canonical
//! path. Entries are created on first use and never removed.
//!
//! # RAII Guards
//!
//! Every acquisition returns a guard that releases on drop, on every exit
//! path. Process-lock markers carry holder metadata while held and are left
//! behind after release.

mod metadata;
pub mod process;
mod registry;
pub mod task;
pub mod thread;
mod wait;

// Re-export public API
pub use metadata::LockMetadata;
pub use process::{LockStatus, ProcessLock, ThreadProcessGuard, acquire_for_thread, inspect};
pub use registry::LockRegistry;
pub use task::{TaskLock, TaskLockGuard, task_locks};
pub use thread::{ThreadLock, ThreadLockGuard, thread_locks};
pub use wait::{Deadline, LockWait};
