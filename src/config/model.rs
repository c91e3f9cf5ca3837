//! Config struct definition and default implementation.

use crate::fs::paths::DEFAULT_LOCK_SUFFIX;
use serde::{Deserialize, Serialize};

/// Configuration shared by the file facades and the CLI.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds to wait for locks before failing.
    ///
    /// `null` waits forever; `0` fails immediately when a lock is taken.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: Option<f64>,

    /// Suffix appended to a file's path to name its process-lock marker.
    #[serde(default = "default_lock_suffix")]
    pub lock_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_timeout_secs: default_lock_timeout_secs(),
            lock_suffix: default_lock_suffix(),
        }
    }
}

fn default_lock_timeout_secs() -> Option<f64> {
    Some(10.0)
}

fn default_lock_suffix() -> String {
    DEFAULT_LOCK_SUFFIX.to_string()
}
