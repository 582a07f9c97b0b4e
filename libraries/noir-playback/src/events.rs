//! Player events and UI snapshot
//!
//! Event-based communication for UI synchronization. Discrete changes go out
//! as `PlayerEvent`s; the continuously moving values (position, labels) are
//! published as a `PlaybackSnapshot` instead so a slow consumer only ever
//! sees the latest frame.

use crate::clock::format_time;
use crate::engine::PlaybackErrorCode;
use crate::state::PlaybackState;
use crate::types::{AudioQuality, PlayerPhase, RepeatMode, ShuffleMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Playback phase changed
    StateChanged {
        /// The new phase
        phase: PlayerPhase,
    },

    /// Current track changed
    ///
    /// For gapless: emitted when the engine reports the transition
    /// For everything else: emitted when the play command is issued
    TrackChanged {
        /// Catalog index of the new track
        index: usize,
        /// Catalog index of the previous track (if any)
        previous_index: Option<usize>,
        /// Whether the engine switched without a gap
        gapless: bool,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// Catalog index of the finished track
        index: usize,
    },

    /// Next track handed to the engine for preloading
    PreloadRequested { path: PathBuf },

    /// A seek started; the displayed position jumped to `target`
    SeekStarted { target: f64 },

    /// The pending seek ended
    SeekSettled {
        /// Position interpolation resumes from
        position: f64,
        /// Whether an engine sample confirmed it (false: safety timeout)
        confirmed: bool,
    },

    /// Bit-perfect/resampled indicator changed
    QualityChanged { quality: AudioQuality },

    /// Error the user should be told about
    ErrorNotice {
        code: PlaybackErrorCode,
        message: String,
    },

    /// Shuffle or repeat mode changed
    ModesChanged {
        shuffle: ShuffleMode,
        repeat: RepeatMode,
    },

    /// Queue changed (tracks added/removed)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
        /// Whether audio is muted
        muted: bool,
    },

    /// Nothing left to play
    PlaybackFinished,
}

/// Latest UI-facing view of the playback state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub phase: Option<PlayerPhase>,
    pub current_index: Option<usize>,
    pub current_path: Option<PathBuf>,
    pub is_playing: bool,
    pub is_seeking: bool,

    /// Displayed position (seconds)
    pub position: f64,
    /// Track duration (seconds, 0.0 when unknown)
    pub duration: f64,
    /// Progress bar fill (0.0-1.0)
    pub fraction: f64,
    pub position_label: String,
    pub duration_label: String,
    pub remaining_label: String,

    pub shuffle: ShuffleMode,
    pub repeat: RepeatMode,
    pub quality: AudioQuality,
    pub volume: u8,
    pub muted: bool,
    pub queue_length: usize,
    /// Queued tracks in play order
    pub queue: Vec<PathBuf>,
}

impl PlaybackSnapshot {
    /// Project the playback state for display
    pub fn capture(state: &PlaybackState, current_path: Option<PathBuf>) -> Self {
        let position = state.displayed_position();
        let duration = state.duration();
        let fraction = if duration > 0.0 {
            (position / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            phase: Some(state.phase()),
            current_index: state.current_track_index(),
            current_path,
            is_playing: state.is_playing(),
            is_seeking: state.is_seek_in_progress(),
            position,
            duration,
            fraction,
            position_label: format_time(position),
            duration_label: format_time(duration),
            remaining_label: format!("-{}", format_time(duration - position)),
            shuffle: state.shuffle_mode(),
            repeat: state.repeat_mode(),
            quality: state.audio_quality(),
            volume: 0,
            muted: false,
            queue_length: 0,
            queue: Vec::new(),
        }
    }
}
