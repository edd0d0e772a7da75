//! Integration Tests for Configuration Loading

use std::fs;

use tempfile::TempDir;
use thermocap::config::loader::{validate_config, LoadOptions};
use thermocap::config::DEFAULT_FILE_SUFFIX;
use thermocap::{Config, ConfigLoader, Error};

#[test]
fn test_defaults_match_the_deployment() {
    let config = Config::default();
    assert_eq!(config.camera.host, "camera-pt-rgbt-mobotix");
    assert_eq!(config.capture.frame_target, 1);
    assert_eq!(config.capture.hard_timeout_secs, 120);
    assert_eq!(config.capture.poll_interval_ms, 5000);
    assert_eq!(config.pipeline.data_dir.to_str(), Some("/data"));
    assert_eq!(config.pipeline.file_suffix, DEFAULT_FILE_SUFFIX);
    assert!(config.pipeline.enforce_dimensions);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_partial_toml_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thermocap.toml");
    fs::write(
        &path,
        r#"
[camera]
host = "10.1.2.3"

[capture]
frame_target = 4
hard_timeout_secs = 30
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.camera.host, "10.1.2.3");
    assert_eq!(config.camera.binary.to_str(), Some("/thermal-raw"));
    assert_eq!(config.capture.frame_target, 4);
    assert_eq!(config.capture.hard_timeout_secs, 30);
    assert_eq!(config.capture.max_empty_reads, 3);
    assert!(config.sinks.log_metrics);
}

#[test]
fn test_json_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thermocap.json");
    fs::write(
        &path,
        r#"{"pipeline": {"data_dir": "/srv/thermal", "enforce_dimensions": false}}"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.pipeline.data_dir.to_str(), Some("/srv/thermal"));
    assert!(!config.pipeline.enforce_dimensions);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thermocap.toml");
    fs::write(&path, "[capture]\npoll_interval_ms = 600000\nhard_timeout_secs = 60\n").unwrap();

    match ConfigLoader::load_from_file(&path) {
        Err(Error::ConfigValidationFailed { field, .. }) => {
            assert_eq!(field, "capture.poll_interval_ms");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_syntax_error_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thermocap.toml");
    fs::write(&path, "[capture\nframe_target = ").unwrap();

    assert!(matches!(
        ConfigLoader::load_from_file(&path),
        Err(Error::ConfigParseFailed { .. })
    ));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        ConfigLoader::load_from_file(&dir.path().join("absent.toml")),
        Err(Error::ConfigLoadFailed { .. })
    ));
}

#[test]
fn test_save_then_search_path_load() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.camera.host = "camera.lab".to_string();
    config.capture.frame_target = 10;

    let mut loader = ConfigLoader::new();
    loader
        .save_to_path(&config, &dir.path().join("config.toml"))
        .unwrap();

    loader.set_search_path(dir.path().join("config"));
    let loaded = loader
        .load_with_options(LoadOptions {
            create_default: false,
            validate: true,
        })
        .unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loader.current_path(), Some(dir.path().join("config.toml").as_path()));
}

#[test]
fn test_no_config_without_defaults() {
    let dir = TempDir::new().unwrap();
    let mut loader = ConfigLoader::new();
    loader.set_search_path(dir.path().join("config"));

    let result = loader.load_with_options(LoadOptions {
        create_default: false,
        validate: true,
    });
    assert!(matches!(result, Err(Error::ConfigNotFound)));

    let config = loader
        .load_with_options(LoadOptions {
            create_default: true,
            validate: true,
        })
        .unwrap();
    assert_eq!(config, Config::default());
}
