// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format:
//! basemap style, map defaults, marker clustering, location source and cache
//! limits. Every field has a serde default so older files keep loading.

use std::sync::Arc;
use std::time::Duration;

use padron_core::{FixedLocationProvider, IpLocationProvider, LocationProvider, Unavailable, UserPosition};
use serde::{Deserialize, Serialize};

use crate::tiles::TileStyle;

const APP_NAME: &str = "padron-desktop";
const CONFIG_NAME: &str = "config";

/// Accuracy reported for a configured override position, in meters.
const OVERRIDE_ACCURACY_METERS: f64 = 10.0;

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Basemap used by the map tab
    #[serde(default)]
    pub tile_style: TileStyle,

    /// Zoom level for a freshly created map
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Group nearby markers into clusters
    #[serde(default = "default_true")]
    pub clustering: bool,

    /// Track the device location on the map tab
    #[serde(default = "default_true")]
    pub location_enabled: bool,

    /// Override GPS latitude (for devices without GPS)
    #[serde(default)]
    pub override_gps_latitude: Option<f64>,

    /// Override GPS longitude (for devices without GPS)
    #[serde(default)]
    pub override_gps_longitude: Option<f64>,

    /// Seconds between location updates while the map is open
    #[serde(default = "default_watch_interval")]
    pub location_watch_interval_secs: u64,

    /// Maximum number of cached household photos
    #[serde(default = "default_photo_cache_entries")]
    pub photo_cache_max_entries: usize,

    /// Days before a cached photo is discarded
    #[serde(default = "default_photo_cache_days")]
    pub photo_cache_max_age_days: u64,

    /// Days before a cached map tile is discarded
    #[serde(default = "default_tile_cache_days")]
    pub tile_cache_max_age_days: u64,

    /// Initial window size in points
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_zoom() -> f64 {
    14.0
}

fn default_watch_interval() -> u64 {
    30
}

fn default_photo_cache_entries() -> usize {
    500
}

fn default_photo_cache_days() -> u64 {
    30
}

fn default_tile_cache_days() -> u64 {
    7
}

fn default_window_size() -> [f32; 2] {
    [1100.0, 760.0]
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Hand-edited files may hold huge day counts; saturate instead of overflowing.
fn days(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(SECONDS_PER_DAY))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            tile_style: TileStyle::default(),
            default_zoom: default_zoom(),
            clustering: true,
            location_enabled: true,
            override_gps_latitude: None,
            override_gps_longitude: None,
            location_watch_interval_secs: default_watch_interval(),
            photo_cache_max_entries: default_photo_cache_entries(),
            photo_cache_max_age_days: default_photo_cache_days(),
            tile_cache_max_age_days: default_tile_cache_days(),
            window_size: default_window_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Whether marker clustering can be used in this build and is switched on.
    pub fn clustering_available(&self) -> bool {
        cfg!(feature = "clustering") && self.clustering
    }

    /// Location source for this configuration.
    pub fn location_provider(&self) -> Arc<dyn LocationProvider> {
        if !self.location_enabled {
            return Arc::new(Unavailable);
        }
        match (self.override_gps_latitude, self.override_gps_longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Arc::new(FixedLocationProvider {
                position: UserPosition {
                    lat,
                    lng,
                    accuracy: OVERRIDE_ACCURACY_METERS,
                },
            }),
            _ => Arc::new(IpLocationProvider),
        }
    }

    pub fn location_watch_interval(&self) -> Duration {
        Duration::from_secs(self.location_watch_interval_secs.max(1))
    }

    pub fn photo_cache_max_age(&self) -> Duration {
        days(self.photo_cache_max_age_days)
    }

    pub fn tile_cache_max_age(&self) -> Duration {
        days(self.tile_cache_max_age_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"clustering": false}"#).unwrap();
        assert!(!config.clustering);
        assert!(config.location_enabled);
        assert!((config.default_zoom - 14.0).abs() < f64::EPSILON);
        assert_eq!(config.tile_style, TileStyle::default());
    }

    #[test]
    fn test_override_provider() {
        let config = AppConfig {
            override_gps_latitude: Some(-12.0),
            override_gps_longitude: Some(-77.0),
            ..AppConfig::default()
        };
        assert_eq!(config.location_provider().name(), "fixed");

        let disabled = AppConfig {
            location_enabled: false,
            ..AppConfig::default()
        };
        assert!(!disabled.location_provider().is_available());
        assert_eq!(AppConfig::default().location_provider().name(), "ip");
    }

    #[test]
    fn test_clustering_follows_feature_and_flag() {
        let mut config = AppConfig::default();
        assert_eq!(config.clustering_available(), cfg!(feature = "clustering"));
        config.clustering = false;
        assert!(!config.clustering_available());
    }

    #[test]
    fn test_huge_cache_age_saturates() {
        let config = AppConfig {
            photo_cache_max_age_days: u64::MAX,
            tile_cache_max_age_days: u64::MAX / 2,
            ..AppConfig::default()
        };
        assert_eq!(config.photo_cache_max_age(), Duration::from_secs(u64::MAX));
        assert_eq!(config.tile_cache_max_age(), Duration::from_secs(u64::MAX));
        assert_eq!(AppConfig::default().tile_cache_max_age(), Duration::from_secs(7 * SECONDS_PER_DAY));
    }
}
