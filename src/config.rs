// Studio configuration, loaded from RON
//
// Every field has a default, so a partial file (or no file at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sequencer::transport::SchedulingMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Prefix of every emitted cue path
    pub resource_root: String,
    pub pixels_per_second: f64,
    pub origin_x: f64,
    pub default_bpm: f64,
    /// Seconds
    pub default_timeline_length: f64,
    pub default_zoom_percent: f64,
    pub default_snap_enabled: bool,
    /// Seconds
    pub default_snap_value: f64,
    pub scheduling: SchedulingMode,
    /// Used for offline rendering and before a device is open
    pub fallback_sample_rate: f32,
    pub master_volume: f32,
    pub notification_capacity: usize,
    pub command_capacity: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            resource_root: "res://assets/audio".to_string(),
            pixels_per_second: 100.0,
            origin_x: 0.0,
            default_bpm: 120.0,
            default_timeline_length: 30.0,
            default_zoom_percent: 100.0,
            default_snap_enabled: true,
            default_snap_value: 0.25,
            scheduling: SchedulingMode::default(),
            fallback_sample_rate: 44100.0,
            master_volume: 0.8,
            notification_capacity: 64,
            command_capacity: 256,
        }
    }
}

impl StudioConfig {
    /// `<config dir>/sound-studio/config.ron`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sound-studio").join("config.ron"))
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::info!(path = %path.display(), "Loaded config");
                Self::from_ron(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from the default location, or defaults if there is none
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = StudioConfig::from_ron("(default_bpm: 90.0, scheduling: polling)").unwrap();
        assert_eq!(config.default_bpm, 90.0);
        assert_eq!(config.scheduling, SchedulingMode::Polling);
        assert_eq!(config.resource_root, "res://assets/audio");
        assert_eq!(config.default_snap_value, 0.25);
    }

    #[test]
    fn test_lookahead_window_parses() {
        let config = StudioConfig::from_ron("(scheduling: lookahead(window: 0.2))").unwrap();
        assert_eq!(config.scheduling, SchedulingMode::Lookahead { window: 0.2 });
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = StudioConfig::load(dir.path().join("nope.ron")).unwrap();
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.ron");
        std::fs::write(&path, "(default_bpm: \"fast\")").unwrap();
        assert!(matches!(StudioConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
