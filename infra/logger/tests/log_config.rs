use mhost_logger::{LevelFilter, LogConfig, LogFormat, LogRotation};

#[test]
fn section_deserializes_with_defaults() {
    let config: LogConfig =
        serde_json::from_value(serde_json::json!({ "level": "warn", "format": "pretty" })).unwrap();

    assert_eq!(config.level_filter().unwrap(), LevelFilter::WARN);
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.rotation, LogRotation::Daily);
    assert!(config.console);
    assert!(config.directory.is_none());
}

#[test]
fn empty_section_is_info_compact_console() {
    let config: LogConfig = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(config, LogConfig::default());
    assert_eq!(config.level_filter().unwrap(), LevelFilter::INFO);
}
