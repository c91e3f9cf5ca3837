//! Holder metadata written into process-lock markers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Who holds (or last held) a process lock.
///
/// Purely diagnostic: ownership is defined by the advisory lock, never by
/// the marker's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// When the lock was acquired (RFC3339).
    pub acquired_at: DateTime<Utc>,
}

impl LockMetadata {
    /// Metadata for the current process, stamped now.
    pub fn current() -> Self {
        Self {
            owner: owner_string(),
            pid: Some(std::process::id()),
            acquired_at: Utc::now(),
        }
    }

    /// Parse metadata from marker content.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw.trim()).ok()
    }

    /// Serialize to a single JSON line.
    pub fn to_json(&self) -> String {
        // Serializing plain strings and numbers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// How long ago the lock was acquired.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// The age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let seconds = age.num_seconds();
        let minutes = age.num_minutes();
        let hours = age.num_hours();

        if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds % 60)
        } else {
            format!("{}s", seconds.max(0))
        }
    }
}

impl std::fmt::Display for LockMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.owner)?;
        if let Some(pid) = self.pid {
            write!(f, " (pid {})", pid)?;
        }
        write!(f, ", held for {}", self.age_string())
    }
}

fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_metadata() {
        let meta = LockMetadata::current();
        assert!(meta.owner.contains('@'));
        assert_eq!(meta.pid, Some(std::process::id()));
        assert!(meta.age().num_minutes() < 1);
    }

    #[test]
    fn test_json_round_trip() {
        let meta = LockMetadata::current();
        let parsed = LockMetadata::parse(&meta.to_json()).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(LockMetadata::parse("").is_none());
        assert!(LockMetadata::parse("not json").is_none());
    }

    #[test]
    fn test_age_string() {
        let mut meta = LockMetadata::current();
        assert!(meta.age_string().ends_with('s'));

        meta.acquired_at = Utc::now() - Duration::minutes(5);
        assert!(meta.age_string().starts_with("5m"));

        meta.acquired_at = Utc::now() - Duration::hours(2);
        assert!(meta.age_string().starts_with("2h"));
    }

    #[test]
    fn test_display_mentions_owner_and_pid() {
        let meta = LockMetadata {
            owner: "ana@build01".to_string(),
            pid: Some(4242),
            acquired_at: Utc::now(),
        };
        let shown = meta.to_string();
        assert!(shown.starts_with("ana@build01 (pid 4242)"));
    }
}
