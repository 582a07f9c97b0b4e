//! Playback tuning configuration
//!
//! Every timing constant of the synchronization engine lives here so the
//! desktop shell can override it from `playback.toml` or the environment
//! (`NOIR_PLAYBACK_*`).

use crate::error::{PlaybackError, Result};
use crate::types::{RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the playback manager and service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Position clock refresh period (default: 16 ms, ~60 Hz)
    pub frame_interval_ms: u64,

    /// Upper bound on interpolation past the last engine sample (default: 150 ms)
    pub max_interpolation_step_ms: u64,

    /// Exponential smoothing factor applied per frame (default: 0.3)
    pub smoothing_factor: f64,

    /// Maximum distance between a sample and the seek target for the sample
    /// to confirm the seek (default: 1.0 s)
    pub seek_tolerance_secs: f64,

    /// Seek confirmation deadline (default: 2000 ms)
    pub seek_safety_timeout_ms: u64,

    /// Gapless preloading enabled (default: true)
    pub gapless_enabled: bool,

    /// Remaining time below which the next track is preloaded (default: 10 s)
    pub gapless_preload_threshold_secs: f64,

    /// Toggle debounce window (default: 250 ms)
    pub toggle_debounce_ms: u64,

    /// Delay between an `ended` event and loading the next track (default: 100 ms)
    pub advance_grace_ms: u64,

    /// Window during which a repeated error code is not surfaced again (default: 2000 ms)
    pub error_notice_window_ms: u64,

    /// Delay before skipping an unplayable track (default: 1000 ms)
    pub error_advance_delay_ms: u64,

    /// Past this position, "previous" restarts the current track (default: 3 s)
    pub previous_restart_threshold_secs: f64,

    /// Initial volume (0-100, default: 80)
    pub volume: u8,

    /// Initial shuffle mode (default: Off)
    pub shuffle: ShuffleMode,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_interpolation_step_ms: 150,
            smoothing_factor: 0.3,
            seek_tolerance_secs: 1.0,
            seek_safety_timeout_ms: 2000,
            gapless_enabled: true,
            gapless_preload_threshold_secs: 10.0,
            toggle_debounce_ms: 250,
            advance_grace_ms: 100,
            error_notice_window_ms: 2000,
            error_advance_delay_ms: 1000,
            previous_restart_threshold_secs: 3.0,
            volume: 80,
            shuffle: ShuffleMode::Off,
            repeat: RepeatMode::Off,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Sources, lowest priority first: built-in defaults, the file at `path`
    /// (format inferred from its extension), `NOIR_PLAYBACK_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| PlaybackError::Config(e.to_string()))?;
        let mut settings = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("NOIR_PLAYBACK").try_parsing(true),
        );

        let loaded: Self = settings
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate ranges
    pub fn validate(&self) -> Result<()> {
        if self.smoothing_factor.is_nan()
            || self.smoothing_factor <= 0.0
            || self.smoothing_factor > 1.0
        {
            return Err(PlaybackError::Config(format!(
                "smoothing_factor must be in (0, 1], got {}",
                self.smoothing_factor
            )));
        }

        if self.frame_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "frame_interval_ms must be positive".to_string(),
            ));
        }

        if self.seek_tolerance_secs.is_nan() || self.seek_tolerance_secs <= 0.0 {
            return Err(PlaybackError::Config(format!(
                "seek_tolerance_secs must be positive, got {}",
                self.seek_tolerance_secs
            )));
        }

        if self.gapless_preload_threshold_secs < 0.0 {
            return Err(PlaybackError::Config(format!(
                "gapless_preload_threshold_secs must not be negative, got {}",
                self.gapless_preload_threshold_secs
            )));
        }

        if self.volume > 100 {
            return Err(PlaybackError::Config(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }

        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn max_interpolation_step(&self) -> Duration {
        Duration::from_millis(self.max_interpolation_step_ms)
    }

    pub fn seek_safety_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_safety_timeout_ms)
    }

    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn advance_grace(&self) -> Duration {
        Duration::from_millis(self.advance_grace_ms)
    }

    pub fn error_notice_window(&self) -> Duration {
        Duration::from_millis(self.error_notice_window_ms)
    }

    pub fn error_advance_delay(&self) -> Duration {
        Duration::from_millis(self.error_advance_delay_ms)
    }
}
