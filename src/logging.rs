//! Logging initialization for the atomfile binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the embedding application. The CLI calls [`init`].

use std::sync::OnceLock;

/// Environment variable selecting the log level.
pub const LOG_ENV: &str = "ATOMFILE_LOG";

static INIT: OnceLock<()> = OnceLock::new();

fn parse_level(raw: &str) -> tracing::Level {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    }
}

/// Initialize tracing output on stderr from `ATOMFILE_LOG` (default `warn`).
///
/// Safe to call multiple times; only the first call installs the subscriber.
/// Best-effort: an already installed global subscriber is left in place.
pub fn init() {
    if INIT.get().is_some() {
        return;
    }
    let level = parse_level(&std::env::var(LOG_ENV).unwrap_or_default());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = INIT.set(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(parse_level(" info "), tracing::Level::INFO);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
        assert_eq!(parse_level(""), tracing::Level::WARN);
        assert_eq!(parse_level("verbose"), tracing::Level::WARN);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
    }
}
