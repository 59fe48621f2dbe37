// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use filmcam::config::{CONFIG_VERSION, ConfigError};
use filmcam::{Config, FacingMode, PrivacySettings, Visibility};

#[test]
fn test_config_default() {
    // Test that default config can be created
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.max_width, 1920);
    assert_eq!(config.max_height, 1080);
    assert_eq!(config.upload_attempts, 3);
    assert_eq!(config.upload_backoff_ms, 1000);
    assert_eq!(config.version, CONFIG_VERSION);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.facing = FacingMode::User;
    config.privacy = Some(PrivacySettings {
        default_photo_visibility: Visibility::Public,
        watermark_photos: true,
        allow_downloads: true,
    });
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.privacy_or_default().default_photo_visibility, Visibility::Public);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"max_width": 800, "facing": "user"}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.max_width, 800);
    assert_eq!(config.max_height, 1080);
    assert_eq!(config.facing, FacingMode::User);
    assert_eq!(config.privacy_or_default(), PrivacySettings::default());
}

#[test]
fn test_unparsable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Parse { .. })
    ));
}
