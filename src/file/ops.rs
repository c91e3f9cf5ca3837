//! Unlocked file primitives shared by every facade variant.
//!
//! Callers hold the appropriate locks; nothing in here takes one.

use crate::codec::{self, Value};
use crate::error::{AtomfileError, Result};
use crate::fs::atomic_write_with;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Decode the file, or `None` if it does not exist.
pub(crate) fn read_value(path: &Path) -> Result<Option<Value>> {
    let codec = codec::codec_for_path(path)?;
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AtomfileError::read(path, e)),
    };

    let mut reader = BufReader::new(file);
    codec
        .decode(&mut reader)
        .map(Some)
        .map_err(|e| AtomfileError::read(path, e))
}

/// Encode `value` and atomically replace the file with it.
pub(crate) fn write_value(path: &Path, value: &Value) -> Result<()> {
    let codec = codec::codec_for_path(path)?;
    atomic_write_with(path, |sink| codec.encode(value, sink))
}

/// Read, merge `value` in, and write back. Returns what was written.
pub(crate) fn update_value(path: &Path, value: Value) -> Result<Value> {
    let merged = merge(read_value(path)?, value);
    write_value(path, &merged)?;
    Ok(merged)
}

/// Shallow merge: top-level keys of `patch` replace those of `current` when
/// both are mappings. Any other combination yields `patch` unchanged.
pub(crate) fn merge(current: Option<Value>, patch: Value) -> Value {
    match (current, patch) {
        (Some(Value::Object(mut base)), Value::Object(patch)) => {
            for (key, value) in patch {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

/// Raw file content, or `None` if it does not exist.
pub(crate) fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AtomfileError::read(path, e)),
    }
}

pub(crate) fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    crate::fs::atomic_write(path, data)
}

/// Append text at the end of the file, creating it if needed.
///
/// Not atomic: a crash mid-append can leave a partial tail.
pub(crate) fn append_text(path: &Path, text: &str) -> Result<()> {
    let append_error = |source| AtomfileError::Append {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(append_error)?;
    file.write_all(text.as_bytes()).map_err(append_error)?;
    file.flush().map_err(append_error)
}
