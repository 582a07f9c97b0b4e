//! Playback state record
//!
//! One mutable record owned by the manager. The components (clock, seek,
//! gapless, selector) each update their own slice of it; the UI only sees
//! projections through the manager or the service snapshot.

use crate::selector::Selection;
use crate::shuffle::ShuffleHistory;
use crate::types::{AudioQuality, PlayerPhase, RepeatMode, ShuffleMode};
use tokio::time::Instant;

/// Seek reconciliation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekPhase {
    /// No seek pending
    #[default]
    Idle,

    /// Seek command issued, engine has not acknowledged it yet
    Requested,

    /// Engine acknowledged (or initiated) the seek, waiting for a sample near the target
    AwaitingConfirmation,
}

/// Mutable playback state
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub(crate) current_track_index: Option<usize>,
    pub(crate) phase: PlayerPhase,

    /// Optimistic playing flag, overridden by engine events
    pub(crate) is_playing: bool,
    pub(crate) is_paused_by_engine: bool,

    pub(crate) duration_seconds: f64,
    pub(crate) last_engine_visible_position: f64,
    pub(crate) last_engine_sample_timestamp: Option<Instant>,
    pub(crate) last_displayed_position: f64,

    pub(crate) seek_phase: SeekPhase,
    pub(crate) seek_target_position: f64,

    pub(crate) shuffle_mode: ShuffleMode,
    pub(crate) repeat_mode: RepeatMode,
    pub(crate) shuffle_history: ShuffleHistory,

    pub(crate) gapless_preload_armed: bool,
    /// Selection handed to the engine by the last preload
    pub(crate) preloaded_next: Option<Selection>,

    pub(crate) audio_quality: AudioQuality,
}

impl PlaybackState {
    pub fn new(shuffle_mode: ShuffleMode, repeat_mode: RepeatMode) -> Self {
        Self {
            current_track_index: None,
            phase: PlayerPhase::Stopped,
            is_playing: false,
            is_paused_by_engine: false,
            duration_seconds: 0.0,
            last_engine_visible_position: 0.0,
            last_engine_sample_timestamp: None,
            last_displayed_position: 0.0,
            seek_phase: SeekPhase::Idle,
            seek_target_position: 0.0,
            shuffle_mode,
            repeat_mode,
            shuffle_history: ShuffleHistory::new(),
            gapless_preload_armed: false,
            preloaded_next: None,
            audio_quality: AudioQuality::Unknown,
        }
    }

    /// Clear all per-track bookkeeping in place
    ///
    /// Track index, phase, modes and shuffle history survive; timers are
    /// cancelled by the manager.
    pub fn reset_for_new_track(&mut self) {
        self.is_paused_by_engine = false;
        self.duration_seconds = 0.0;
        self.last_engine_visible_position = 0.0;
        self.last_engine_sample_timestamp = None;
        self.last_displayed_position = 0.0;
        self.seek_phase = SeekPhase::Idle;
        self.seek_target_position = 0.0;
        self.gapless_preload_armed = false;
        self.preloaded_next = None;
        self.audio_quality = AudioQuality::Unknown;
    }

    /// Disarm the pending preload so the next sample recomputes it
    pub(crate) fn disarm_preload(&mut self) {
        self.gapless_preload_armed = false;
        self.preloaded_next = None;
    }

    pub fn current_track_index(&self) -> Option<usize> {
        self.current_track_index
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_paused_by_engine(&self) -> bool {
        self.is_paused_by_engine
    }

    pub fn duration(&self) -> f64 {
        self.duration_seconds
    }

    /// Position shown to the user (seconds)
    pub fn displayed_position(&self) -> f64 {
        self.last_displayed_position
    }

    /// Last position reported by the engine (seconds)
    pub fn engine_position(&self) -> f64 {
        self.last_engine_visible_position
    }

    pub fn seek_phase(&self) -> SeekPhase {
        self.seek_phase
    }

    pub fn is_seek_in_progress(&self) -> bool {
        self.seek_phase != SeekPhase::Idle
    }

    pub fn seek_target(&self) -> Option<f64> {
        self.is_seek_in_progress()
            .then_some(self.seek_target_position)
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.shuffle_mode
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn shuffle_history(&self) -> &ShuffleHistory {
        &self.shuffle_history
    }

    pub fn is_preload_armed(&self) -> bool {
        self.gapless_preload_armed
    }

    pub fn audio_quality(&self) -> AudioQuality {
        self.audio_quality
    }

    /// Time left in the current track, if the duration is known
    pub fn remaining(&self) -> Option<f64> {
        (self.duration_seconds > 0.0)
            .then(|| (self.duration_seconds - self.last_engine_visible_position).max(0.0))
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(ShuffleMode::Off, RepeatMode::Off)
    }
}
