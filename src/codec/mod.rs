//! Format registry mapping file extensions to codecs.
//!
//! The registry is a process-wide table populated with the built-in JSON,
//! YAML, TOML, and plain-text codecs on first use. Additional formats are
//! contributed through [`register_format`] or [`register_fn`]; a codec
//! registered before the first file operation is indistinguishable from a
//! built-in one.
//!
//! Registration is not atomic relative to concurrent lookups. Register custom
//! formats at startup, before files are accessed concurrently.
//!
//! # Example
//!
//! ```no_run
//! use atomfile::codec::{self, Value};
//! use std::io::{Read, Write};
//!
//! codec::register_fn(
//!     "csv",
//!     |reader: &mut dyn Read| {
//!         let mut raw = String::new();
//!         reader.read_to_string(&mut raw)?;
//!         let rows: Vec<Value> = raw.lines().map(|l| Value::String(l.to_string())).collect();
//!         Ok(Value::Array(rows))
//!     },
//!     |value: &Value, writer: &mut dyn Write| {
//!         for row in value.as_array().into_iter().flatten() {
//!             writeln!(writer, "{}", row.as_str().unwrap_or_default())?;
//!         }
//!         Ok(())
//!     },
//! );
//! assert!(codec::supported_formats().contains(&".csv".to_string()));
//! ```

mod builtin;

#[cfg(test)]
mod tests;

pub use builtin::{JsonCodec, TextCodec, TomlCodec, YamlCodec};

use crate::error::{AtomfileError, BoxError, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Decoded file content.
///
/// Mappings, sequences, and scalars are all represented by this one tagged
/// union; codecs for formats without a native notion of some variant reject
/// it at encode time.
pub type Value = serde_json::Value;

/// A decode/encode pair for one file format.
pub trait Codec: Send + Sync {
    /// Decode the complete content of `reader` into a value.
    fn decode(&self, reader: &mut dyn Read) -> std::result::Result<Value, BoxError>;

    /// Encode `value` into `writer`.
    fn encode(&self, value: &Value, writer: &mut dyn Write) -> std::result::Result<(), BoxError>;
}

/// Codec assembled from a pair of closures.
pub struct FnCodec<D, E> {
    decode: D,
    encode: E,
}

impl<D, E> FnCodec<D, E>
where
    D: Fn(&mut dyn Read) -> std::result::Result<Value, BoxError> + Send + Sync,
    E: Fn(&Value, &mut dyn Write) -> std::result::Result<(), BoxError> + Send + Sync,
{
    pub fn new(decode: D, encode: E) -> Self {
        Self { decode, encode }
    }
}

impl<D, E> Codec for FnCodec<D, E>
where
    D: Fn(&mut dyn Read) -> std::result::Result<Value, BoxError> + Send + Sync,
    E: Fn(&Value, &mut dyn Write) -> std::result::Result<(), BoxError> + Send + Sync,
{
    fn decode(&self, reader: &mut dyn Read) -> std::result::Result<Value, BoxError> {
        (self.decode)(reader)
    }

    fn encode(&self, value: &Value, writer: &mut dyn Write) -> std::result::Result<(), BoxError> {
        (self.encode)(value, writer)
    }
}

/// Normalize an extension to its registry key: lowercase with a leading `.`.
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Extension → codec table.
///
/// The process-wide instance is reached through the free functions in this
/// module; standalone instances are useful for embedding and tests.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: BTreeMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in codecs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let yaml: Arc<dyn Codec> = Arc::new(YamlCodec);
        registry.insert(".yaml", Arc::clone(&yaml));
        registry.insert(".yml", yaml);
        registry.insert(".json", Arc::new(JsonCodec));
        registry.insert(".toml", Arc::new(TomlCodec));
        registry.insert(".txt", Arc::new(TextCodec));
        registry
    }

    /// Register `codec` for `ext`, replacing any earlier registration.
    pub fn insert(&mut self, ext: &str, codec: Arc<dyn Codec>) {
        self.codecs.insert(normalize_extension(ext), codec);
    }

    /// Look up the codec registered for `ext`.
    pub fn get(&self, ext: &str) -> Result<Arc<dyn Codec>> {
        let key = normalize_extension(ext);
        self.codecs
            .get(&key)
            .cloned()
            .ok_or(AtomfileError::UnsupportedFormat { extension: key })
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> Vec<String> {
        self.codecs.keys().cloned().collect()
    }
}

static REGISTRY: LazyLock<RwLock<CodecRegistry>> =
    LazyLock::new(|| RwLock::new(CodecRegistry::with_defaults()));

/// Register a codec for a file extension (with or without the leading dot).
pub fn register_format<C: Codec + 'static>(ext: &str, codec: C) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.insert(ext, Arc::new(codec));
    tracing::debug!(extension = %normalize_extension(ext), "registered format");
}

/// Register a codec built from a decode closure and an encode closure.
pub fn register_fn<D, E>(ext: &str, decode: D, encode: E)
where
    D: Fn(&mut dyn Read) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    E: Fn(&Value, &mut dyn Write) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
    register_format(ext, FnCodec::new(decode, encode));
}

/// Look up the codec for an extension in the process-wide registry.
pub fn lookup(ext: &str) -> Result<Arc<dyn Codec>> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(ext)
}

/// Look up the codec for a path by its extension.
pub fn codec_for_path(path: &Path) -> Result<Arc<dyn Codec>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    lookup(ext)
}

/// Currently supported extensions, sorted.
pub fn supported_formats() -> Vec<String> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .extensions()
}
