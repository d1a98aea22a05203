//! Configuration management for the focus timer core
//!
//! Runtime configuration is loaded from a JSON file so interval lengths,
//! storage location and the sound backend can be changed without
//! recompilation. A missing or malformed file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub observers: ObserverConfig,
}

/// Which store adapter backs the engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One file per key under `data_dir`
    File,
    /// Process-local map, nothing survives a restart
    Memory,
}

/// Persistent store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    /// Directory holding one file per key (file backend only)
    pub data_dir: PathBuf,
    /// Key of the full timer session record
    pub timer_key: String,
    /// Key of the shared background volume
    pub volume_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: PathBuf::from(".focus-timer"),
            timer_key: "timerState".to_string(),
            volume_key: "backgroundSoundVolume".to_string(),
        }
    }
}

/// Interval lengths used by the tick driver, plus engine behaviour switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    pub focus_seconds: u32,
    pub break_seconds: u32,
    pub long_break_seconds: u32,
    /// A long break follows every N-th completed focus session
    pub long_break_interval: u32,
    /// Pause an active timer when the host reports the page hidden
    pub auto_pause_on_hidden: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_seconds: 25 * 60,
            break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
            long_break_interval: 4,
            auto_pause_on_hidden: true,
        }
    }
}

/// Which backend produces channel resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundBackendKind {
    /// Looping WAV files rendered through the default output device
    Cpal,
    /// Deterministic in-memory channels, no audio output
    Simulated,
}

/// Background sound configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub backend: SoundBackendKind,
    /// Volume used when nothing valid is persisted
    pub default_volume: f32,
    /// Directory holding `<channel>.wav` loops
    pub assets_dir: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            backend: SoundBackendKind::Cpal,
            default_volume: 0.5,
            assets_dir: PathBuf::from("assets/sounds"),
        }
    }
}

/// Broadcast buffer sizes for state observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub timer_buffer: usize,
    pub sound_buffer: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            timer_buffer: 64,
            sound_buffer: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/focus_config.json")
    }

    /// Configuration suited to tests and headless hosts: memory store,
    /// simulated channels
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageConfig {
                backend: StoreBackend::Memory,
                ..StorageConfig::default()
            },
            sound: SoundConfig {
                backend: SoundBackendKind::Simulated,
                ..SoundConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.timer.focus_seconds, 1500);
        assert_eq!(config.timer.long_break_interval, 4);
        assert_eq!(config.sound.default_volume, 0.5);
        assert_eq!(config.storage.timer_key, "timerState");
        assert_eq!(config.storage.backend, StoreBackend::File);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "timer": { "focus_seconds": 3000 }, "sound": { "backend": "simulated" } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.timer.focus_seconds, 3000);
        assert_eq!(parsed.timer.break_seconds, 300);
        assert_eq!(parsed.sound.backend, SoundBackendKind::Simulated);
        assert_eq!(parsed.storage.volume_key, "backgroundSoundVolume");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/focus_config.json");
        assert_eq!(config.timer.break_seconds, 300);
    }

    #[test]
    fn test_ephemeral_config() {
        let config = AppConfig::ephemeral();
        assert_eq!(config.storage.backend, StoreBackend::Memory);
        assert_eq!(config.sound.backend, SoundBackendKind::Simulated);
    }
}
