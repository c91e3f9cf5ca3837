//! atomfile: atomic, lock-coordinated, format-pluggable file access.
//!
//! Many threads, async tasks, and independent processes can read and write
//! the same file without interleaving partial writes and without any reader
//! ever observing a half-written file.
//!
//! - Every write goes to a temporary sibling that is synced and then renamed
//!   onto the target ([`fs::atomic_write`]).
//! - Operations take an in-process lock (thread or task) and then an
//!   advisory process lock on `<file>.lock` ([`locks`]).
//! - The file extension selects a codec from a pluggable registry
//!   ([`codec`]); JSON, YAML, TOML and plain text are built in.
//!
//! # Example
//!
//! ```no_run
//! use atomfile::ThreadedSafeFile;
//! use serde_json::json;
//!
//! let file = ThreadedSafeFile::new("settings.json")?;
//! file.write(&json!({ "volume": 3 }))?;
//! assert_eq!(file.read()?, Some(json!({ "volume": 3 })));
//!
//! // Read-modify-write under one lock acquisition.
//! let guard = file.locked()?;
//! let mut settings = guard.read()?.unwrap_or_default();
//! settings["volume"] = json!(4);
//! guard.write(&settings)?;
//! # Ok::<(), atomfile::AtomfileError>(())
//! ```

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod file;
pub mod fs;
pub mod locks;
pub mod logging;

pub use codec::{Codec, Value, register_fn, register_format, supported_formats};
pub use config::Config;
pub use error::{AtomfileError, Result};
pub use file::{AsyncLockedFile, AsyncSafeFile, LockedFile, SafeFile, ThreadedSafeFile};
pub use locks::LockWait;
