//! Configuration loading against the real process environment
//!
//! Tests that set environment variables are `#[serial]` so they don't race.

use jfai_common::config::ProcessorConfig;
use jfai_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;

const VARS: &[&str] = &[
    "JELLYFIN_URL",
    "JELLYFIN_USERNAME",
    "JELLYFIN_PASSWORD",
    "QWEN_AUDIO_URL",
    "QWEN_MAX_TOKENS",
    "QWEN_TIMEOUT",
    "NEO4J_URI",
    "NEO4J_USER",
    "NEO4J_PASSWORD",
    "NEO4J_DATABASE",
    "DATABASE_URL",
    "REDIS_URL",
    "PROCESSING_INTERVAL",
    "ITEM_DELAY_MS",
    "ERROR_BACKOFF",
    "DEDUP_TTL",
    "HEALTH_ADDR",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn write_toml(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_defaults_without_file_or_env() {
    clear_env();

    let config = ProcessorConfig::load(None).unwrap();
    assert_eq!(config, ProcessorConfig::default());
    assert_eq!(config.jellyfin.url, "http://jellyfin:8096");
    assert_eq!(config.schedule.interval_secs, 300);
    assert_eq!(config.cache.ttl_secs, 86_400);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let file = write_toml(
        r#"
        [jellyfin]
        url = "http://media.local:8096"

        [schedule]
        interval_secs = 120
        "#,
    );

    env::set_var("PROCESSING_INTERVAL", "60");
    env::set_var("REDIS_URL", "redis://cache.local:6379/2");
    let config = ProcessorConfig::load(Some(file.path()));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.jellyfin.url, "http://media.local:8096");
    assert_eq!(config.schedule.interval_secs, 60);
    assert_eq!(config.cache.url, "redis://cache.local:6379/2");
    // Untouched keys keep their defaults
    assert_eq!(config.graph.uri, "http://neo4j:7474");
}

#[test]
#[serial]
fn test_unparseable_numeric_env_is_config_error() {
    clear_env();
    env::set_var("QWEN_TIMEOUT", "five minutes");
    let result = ProcessorConfig::load(None);
    clear_env();

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("QWEN_TIMEOUT")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_zero_interval_rejected() {
    clear_env();
    env::set_var("PROCESSING_INTERVAL", "0");
    let result = ProcessorConfig::load(None);
    clear_env();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_empty_password_from_env_is_kept() {
    clear_env();
    env::set_var("JELLYFIN_PASSWORD", "");
    let result = ProcessorConfig::load(None);
    clear_env();

    assert_eq!(result.unwrap().jellyfin.password, "");
}

#[test]
fn test_missing_toml_file_is_config_error() {
    let result = ProcessorConfig::from_toml_file(std::path::Path::new("/nonexistent/jfai.toml"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let file = write_toml("[schedule\ninterval_secs = ");
    assert!(matches!(
        ProcessorConfig::from_toml_file(file.path()),
        Err(Error::Config(_))
    ));
}
