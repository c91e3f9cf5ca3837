//! Exit code constants for the atomfile CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing file, unsupported format)
//! - 2: I/O failure (read, write, or append)
//! - 3: Lock acquisition failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, missing input file, unsupported format, bad config.
pub const USER_ERROR: i32 = 1;

/// I/O failure while reading, writing, or appending.
pub const IO_FAILURE: i32 = 2;

/// Lock acquisition failure: timeout or lock primitive error.
pub const LOCK_FAILURE: i32 = 3;
