//! Error types for atomfile.
//!
//! Uses thiserror for derive macros. Every variant carries the path it
//! concerns so messages stay actionable when several files are in play.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by codecs and other pluggable collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for atomfile operations.
#[derive(Error, Debug)]
pub enum AtomfileError {
    /// An existing file could not be read or decoded.
    ///
    /// A missing file is never reported through this variant; reads of
    /// absent files yield `None`.
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Encoding, writing the temporary artifact, or the atomic replace failed.
    #[error("failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The non-atomic append failed.
    #[error("failed to append to '{}': {source}", .path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A bounded lock wait expired. Non-blocking attempts report a zero timeout.
    #[error("timed out after {:.3}s waiting for lock on '{}'", .timeout.as_secs_f64(), .path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// The lock primitive failed for a reason other than contention.
    #[error("lock failure on '{}': {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No codec is registered for the file's extension.
    #[error("no format registered for extension '{extension}'")]
    UnsupportedFormat { extension: String },

    /// Invalid input or configuration.
    #[error("{0}")]
    UserError(String),
}

impl AtomfileError {
    /// Returns the CLI exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AtomfileError::Read { .. }
            | AtomfileError::Write { .. }
            | AtomfileError::Append { .. } => exit_codes::IO_FAILURE,
            AtomfileError::LockTimeout { .. } | AtomfileError::Lock { .. } => {
                exit_codes::LOCK_FAILURE
            }
            AtomfileError::UnsupportedFormat { .. } | AtomfileError::UserError(_) => {
                exit_codes::USER_ERROR
            }
        }
    }

    /// Whether this error is a lock wait that ran out of time.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, AtomfileError::LockTimeout { .. })
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        AtomfileError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        AtomfileError::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Result type alias for atomfile operations.
pub type Result<T> = std::result::Result<T, AtomfileError>;
