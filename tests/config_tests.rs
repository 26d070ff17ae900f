// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use inapp_camera::{BitratePreset, Config, Lens};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.default_lens, Lens::Front);
    assert!(config.record_audio, "Audio should be recorded by default");
    assert_eq!(config.video.max_width, 400);
    assert_eq!(config.video.max_height, 400);
    assert_eq!(config.video.framerate, 10);
    assert_eq!(config.video.bitrate_preset, BitratePreset::Medium);
}

#[test]
fn test_config_default_is_not_legacy_platform() {
    let config = Config::default();
    assert!(config.platform_level > 28);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        back_device: Some("/dev/video2".into()),
        default_lens: Lens::Back,
        output_root: Some(dir.path().join("clips")),
        record_audio: false,
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_lens_names_in_file() {
    let config: Config = serde_json::from_str(r#"{ "default_lens": "Back" }"#).unwrap();
    assert_eq!(config.default_lens, Lens::Back);
}

#[test]
fn test_configured_output_root_wins() {
    let config = Config {
        output_root: Some("/srv/clips".into()),
        ..Config::default()
    };
    assert_eq!(config.output_root(), std::path::PathBuf::from("/srv/clips"));
}
