//! Tests for config functionality.

use crate::config::Config;
use crate::locks::LockWait;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_timeout_secs, Some(10.0));
    assert_eq!(config.lock_suffix, ".lock");
    assert_eq!(config.lock_wait(), LockWait::Timeout(Duration::from_secs(10)));
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();

    // Should use all defaults
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_timeout_secs: 2.5
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_wait(), LockWait::Timeout(Duration::from_millis(2500)));
    // Unspecified values should use defaults
    assert_eq!(config.lock_suffix, ".lock");
}

#[test]
fn test_null_timeout_blocks() {
    let config = Config::from_yaml("lock_timeout_secs: null\n").unwrap();
    assert_eq!(config.lock_timeout_secs, None);
    assert_eq!(config.lock_wait(), LockWait::Blocking);
}

#[test]
fn test_zero_timeout_is_non_blocking() {
    let config = Config::from_yaml("lock_timeout_secs: 0\n").unwrap();
    assert_eq!(config.lock_wait(), LockWait::NonBlocking);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
lock_suffix: .guard
future_option: true
nested:
  key: value
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.lock_suffix, ".guard");
}

#[test]
fn test_negative_timeout_rejected() {
    let err = Config::from_yaml("lock_timeout_secs: -1\n").unwrap_err();
    assert!(err.to_string().contains("lock_timeout_secs"));
}

#[test]
fn test_timeout_too_large_for_duration_rejected() {
    let config = Config {
        lock_timeout_secs: Some(1e30),
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("too large"));
    assert!(Config::from_yaml("lock_timeout_secs: 1.0e30\n").is_err());
}

#[test]
fn test_suffix_validation() {
    for bad in ["lock", ".", ".a/b", ""] {
        let config = Config {
            lock_suffix: bad.to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err(), "suffix {:?} should be rejected", bad);
    }
}

#[test]
fn test_invalid_yaml_is_user_error() {
    let err = Config::from_yaml("lock_timeout_secs: [unclosed").unwrap_err();
    assert_eq!(err.exit_code(), crate::exit_codes::USER_ERROR);
}

#[test]
fn test_yaml_round_trip() {
    let config = Config {
        lock_timeout_secs: None,
        lock_suffix: ".lck".to_string(),
    };
    let yaml = config.to_yaml().unwrap();
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("atomfile.yaml");
    std::fs::write(&path, "lock_timeout_secs: 1\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.lock_wait(), LockWait::Timeout(Duration::from_secs(1)));

    let missing = Config::load(temp.path().join("missing.yaml")).unwrap_err();
    assert!(missing.to_string().contains("failed to read config file"));
}
