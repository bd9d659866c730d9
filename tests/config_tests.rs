// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use jolt::Config;
use jolt::config::AppTheme;
use jolt::constants::{DEFAULT_FOLDER_NAME, DEFAULT_JPEG_QUALITY};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.folder_name, DEFAULT_FOLDER_NAME);
    assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
    assert_eq!(config.app_theme, AppTheme::System);
    assert!(config.last_camera_id.is_none());
    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
}

#[test]
fn test_jpeg_quality_is_clamped() {
    let mut config = Config::default();
    config.jpeg_quality = 0;
    assert_eq!(config.effective_jpeg_quality(), 1);
    config.jpeg_quality = 250;
    assert_eq!(config.effective_jpeg_quality(), 100);
    config.jpeg_quality = 75;
    assert_eq!(config.effective_jpeg_quality(), 75);
}

#[test]
fn test_unusable_folder_names_fall_back() {
    let mut config = Config::default();
    for bad in ["", "   ", ".", "..", "a/b"] {
        config.folder_name = bad.to_string();
        assert_eq!(
            config.effective_folder_name(),
            DEFAULT_FOLDER_NAME,
            "{bad:?} should fall back"
        );
    }
    config.folder_name = "Holiday".to_string();
    assert_eq!(config.effective_folder_name(), "Holiday");
}

#[test]
fn test_theme_index_round_trip() {
    for (index, theme) in AppTheme::ALL.iter().enumerate() {
        assert_eq!(theme.index(), index);
    }
}
