//! Path resolution helpers.
//!
//! Lock registries key their entries by canonical path, so two spellings of
//! the same file (relative vs. absolute, `a/../b`, symlinked directories) must
//! resolve to one key even when the file does not exist yet.

use super::atomic::{TEMP_SUFFIX, atomic_write};
use crate::error::{AtomfileError, Result};
use globset::Glob;
use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Files whose presence marks a project root.
pub const PROJECT_MARKERS: &[&str] = &[".git", "Cargo.toml", "pyproject.toml", "package.json"];

/// Default suffix appended to a target path to form its process-lock marker.
pub const DEFAULT_LOCK_SUFFIX: &str = ".lock";

/// Resolve `path` to the absolute, normalized form used as a lock key.
///
/// Relative paths are anchored at the current directory, `.` and `..` are
/// folded lexically, and symlinks are resolved for the file itself or, when
/// it does not exist yet, for its parent directory.
pub fn canonical_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = env::current_dir().map_err(|e| {
            AtomfileError::UserError(format!("failed to get current working directory: {}", e))
        })?;
        cwd.join(path)
    };
    let normalized = normalize_lexically(&absolute);

    if let Ok(resolved) = fs::canonicalize(&normalized) {
        return Ok(resolved);
    }
    if let (Some(parent), Some(name)) = (normalized.parent(), normalized.file_name())
        && let Ok(parent) = fs::canonicalize(parent)
    {
        return Ok(parent.join(name));
    }
    Ok(normalized)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The process-lock marker for `target`: the full file name plus `suffix`.
pub fn lock_marker_path(target: &Path, suffix: &str) -> PathBuf {
    let mut marker = target.as_os_str().to_os_string();
    marker.push(suffix);
    PathBuf::from(marker)
}

/// Resolve `path` against `base` (or the current directory) without touching
/// the filesystem beyond what [`canonical_path`] does.
pub fn resolve_path<P: AsRef<Path>>(path: P, base: Option<&Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    match base {
        Some(base) if path.is_relative() => canonical_path(base.join(path)),
        _ => canonical_path(path),
    }
}

/// Walk up from `start` to the nearest directory containing a project marker.
pub fn find_project_root<P: AsRef<Path>>(start: P) -> Option<PathBuf> {
    let start = canonical_path(start).ok()?;
    start
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

/// Find files under `root` whose path relative to `root` matches `pattern`.
///
/// Results are sorted. Lock markers ending in `lock_suffix` and temporary
/// artifacts are skipped.
pub fn find_project_files<P: AsRef<Path>>(
    root: P,
    pattern: &str,
    lock_suffix: &str,
) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let matcher = Glob::new(pattern)
        .map_err(|e| AtomfileError::UserError(format!("invalid glob '{}': {}", pattern, e)))?
        .compile_matcher();

    let mut found = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| e.file_name() != ".git") {
        let entry = entry.map_err(|e| {
            AtomfileError::UserError(format!("failed to walk '{}': {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(lock_suffix) || is_temporary_name(&name) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if matcher.is_match(relative) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// Atomically create `dir/filename` with `content`, creating `dir` if needed.
pub fn create_file<P: AsRef<Path>>(dir: P, filename: &str, content: &str) -> Result<PathBuf> {
    let path = dir.as_ref().join(filename);
    atomic_write(&path, content.as_bytes())?;
    Ok(path)
}

/// Delete a file. Deleting a file that does not exist is not an error.
pub fn delete_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AtomfileError::write(path, e)),
    }
}

fn is_temporary_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX) && name.len() > 1 + TEMP_SUFFIX.len()
}

/// List temporary artifacts left in `dir` by interrupted writes.
///
/// These are never swept automatically; callers decide whether to remove them.
pub fn find_stale_temporaries<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| AtomfileError::read(dir, e))?;

    let mut stale = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AtomfileError::read(dir, e))?;
        let name = entry.file_name();
        if is_temporary_name(&name.to_string_lossy())
            && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
        {
            stale.push(entry.path());
        }
    }
    stale.sort();
    Ok(stale)
}
