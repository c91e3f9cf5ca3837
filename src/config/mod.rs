//! Configuration model for atomfile.
//!
//! This module defines the Config struct that can be loaded from a YAML file
//! (the CLI's `--config` option). It supports forward-compatible YAML parsing
//! (unknown fields are ignored), sensible defaults for omitted fields, and
//! validation of config values.

mod model;
mod operations;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
