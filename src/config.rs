use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PIXELS_PER_BAR, DEFAULT_TRACK_HEIGHT, MAX_PIXELS_PER_BAR, MIN_PIXELS_PER_BAR,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub view: ViewConfig,
    pub grid: GridConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub default_track_height: f32,
    pub show_headers: bool,
    pub auto_scroll_on_playback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub pixels_per_bar: f32,
    pub min_pixels_per_bar: f32,
    pub max_pixels_per_bar: f32,
    /// Snap choices offered by the host UI, in bars.
    pub snap_divisions: Vec<f64>,
    pub snap_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub scrub_on_ruler_click: bool,
    pub clear_selection_on_background_click: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view: ViewConfig {
                default_track_height: DEFAULT_TRACK_HEIGHT,
                show_headers: true,
                auto_scroll_on_playback: true,
            },
            grid: GridConfig {
                pixels_per_bar: DEFAULT_PIXELS_PER_BAR,
                min_pixels_per_bar: MIN_PIXELS_PER_BAR,
                max_pixels_per_bar: MAX_PIXELS_PER_BAR,
                snap_divisions: vec![1.0, 0.5, 0.25, 0.125, 0.0625],
                snap_enabled: true,
            },
            behavior: BehaviorConfig {
                scrub_on_ruler_click: true,
                clear_selection_on_background_click: true,
            },
        }
    }
}

impl Config {
    fn path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "arrangegrid")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(back.grid.pixels_per_bar, config.grid.pixels_per_bar);
        assert_eq!(back.grid.snap_divisions, config.grid.snap_divisions);
    }
}
