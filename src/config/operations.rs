//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{AtomfileError, Result};
use crate::locks::LockWait;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(AtomfileError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AtomfileError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AtomfileError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            AtomfileError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_timeout_secs`, when set, must be a finite, non-negative number
    ///   small enough to fit a `Duration`
    /// - `lock_suffix` must start with `.` and name something after it
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.lock_timeout_secs
            && (!secs.is_finite() || secs < 0.0)
        {
            return Err(AtomfileError::UserError(format!(
                "config validation failed: lock_timeout_secs must be a non-negative number (found {})",
                secs
            )));
        }

        if let Some(secs) = self.lock_timeout_secs
            && Duration::try_from_secs_f64(secs).is_err()
        {
            return Err(AtomfileError::UserError(format!(
                "config validation failed: lock_timeout_secs is too large (found {})",
                secs
            )));
        }

        if !self.lock_suffix.starts_with('.') || self.lock_suffix.len() < 2 {
            return Err(AtomfileError::UserError(format!(
                "config validation failed: lock_suffix must start with '.' (found '{}')",
                self.lock_suffix
            )));
        }

        if self.lock_suffix.contains(['/', '\\']) {
            return Err(AtomfileError::UserError(format!(
                "config validation failed: lock_suffix must not contain path separators (found '{}')",
                self.lock_suffix
            )));
        }

        Ok(())
    }

    /// The lock waiting policy this config describes.
    pub fn lock_wait(&self) -> LockWait {
        LockWait::from_secs(self.lock_timeout_secs)
    }
}
