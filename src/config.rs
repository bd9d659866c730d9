// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{DEFAULT_FOLDER_NAME, DEFAULT_JPEG_QUALITY};
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use cosmic::{Theme, theme};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Application theme preference
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum AppTheme {
    /// Follow system theme (dark or light based on system setting)
    #[default]
    System,
    /// Always use dark theme
    Dark,
    /// Always use light theme
    Light,
}

impl AppTheme {
    pub const ALL: [AppTheme; 3] = [AppTheme::System, AppTheme::Dark, AppTheme::Light];

    /// Get the COSMIC theme for this app theme preference
    pub fn theme(&self) -> Theme {
        match self {
            Self::Dark => {
                let mut theme = theme::system_dark();
                theme.theme_type.prefer_dark(Some(true));
                theme
            }
            Self::Light => {
                let mut theme = theme::system_light();
                theme.theme_type.prefer_dark(Some(false));
                theme
            }
            Self::System => theme::system_preference(),
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Application theme preference (System, Dark, Light)
    pub app_theme: AppTheme,
    /// Last used camera device id
    pub last_camera_id: Option<String>,
    /// Name of the photo folder inside the Pictures directory
    pub folder_name: String,
    /// JPEG quality for captured photos (1-100)
    pub jpeg_quality: u8,
    /// Mirror camera preview horizontally (selfie mode); saved photos are never mirrored
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_theme: AppTheme::default(),
            last_camera_id: None,
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            mirror_preview: true,
        }
    }
}

impl Config {
    /// JPEG quality clamped to what the encoder accepts
    pub fn effective_jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }

    /// Folder name, falling back to the default when the stored one is unusable
    pub fn effective_folder_name(&self) -> &str {
        let name = self.folder_name.trim();
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            DEFAULT_FOLDER_NAME
        } else {
            name
        }
    }
}

/// Open the config handler for `app_id` and read the current entry.
///
/// Falls back to defaults (and no handler) when the config store is unavailable.
pub fn load(app_id: &str) -> (Option<cosmic_config::Config>, Config) {
    match cosmic_config::Config::new(app_id, Config::VERSION) {
        Ok(handler) => {
            let config = match Config::get_entry(&handler) {
                Ok(config) => config,
                Err((errors, config)) => {
                    error!(?errors, "Errors loading config");
                    config
                }
            };
            (Some(handler), config)
        }
        Err(err) => {
            error!(%err, "Failed to create config handler");
            (None, Config::default())
        }
    }
}
