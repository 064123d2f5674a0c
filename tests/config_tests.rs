// Config loading and validation tests

use brokerstats::config::AppConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[store]
path = "data/entities.db"
retention_days = 14

[snapshot]
query_timeout_ms = 2000
stats_log_interval_secs = 60
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.store.path, "data/entities.db");
    assert_eq!(config.store.retention_days, 14);
    assert_eq!(config.snapshot.query_timeout(), Duration::from_secs(2));
    assert_eq!(config.snapshot.stats_log_interval_secs, 60);
}

#[test]
fn test_config_defaults_when_omitted() {
    let minimal = r#"
[server]
port = 8081
host = "0.0.0.0"

[store]
path = "data/entities.db"
"#;
    let config = AppConfig::load_from_str(minimal).expect("valid");
    assert_eq!(config.store.retention_days, 7);
    assert_eq!(config.snapshot.query_timeout_ms, 5000);
    assert_eq!(config.snapshot.stats_log_interval_secs, 300);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_store_path() {
    let bad = VALID_CONFIG.replace("path = \"data/entities.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("store.path"));
}

#[test]
fn test_config_validation_rejects_retention_zero() {
    let bad = VALID_CONFIG.replace("retention_days = 14", "retention_days = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("retention_days"));
}

#[test]
fn test_config_validation_rejects_query_timeout_zero() {
    let bad = VALID_CONFIG.replace("query_timeout_ms = 2000", "query_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("query_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 60",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_rejects_missing_store_section() {
    let bad = "[server]\nport = 1\nhost = \"x\"\n";
    assert!(AppConfig::load_from_str(bad).is_err());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.store.path, "data/entities.db");
}
