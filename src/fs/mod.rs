//! Filesystem utilities for atomfile.
//!
//! This module provides the atomic write primitive every write path relies on,
//! plus the path helpers used to derive lock keys and marker files.

pub mod atomic;
pub mod paths;

pub use atomic::{atomic_write, atomic_write_with};
pub use paths::{
    canonical_path, create_file, delete_file, find_project_files, find_project_root,
    find_stale_temporaries, lock_marker_path, resolve_path,
};
