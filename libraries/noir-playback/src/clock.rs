//! Position clock
//!
//! The engine reports its position about ten times per second. The clock
//! runs once per display frame and interpolates between those samples so
//! the progress bar moves smoothly: it extrapolates from the last sample by
//! the wall time elapsed since (capped), eases the displayed value toward
//! that target, and never lets the displayed value move backwards.
//!
//! Backward moves only happen through the seek coordinator or a track reset.

use crate::state::PlaybackState;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Frame-rate position interpolator
#[derive(Debug, Clone)]
pub struct PositionClock {
    max_step: Duration,
    smoothing: f64,
    running: bool,
}

impl PositionClock {
    pub fn new(max_step: Duration, smoothing: f64) -> Self {
        Self {
            max_step,
            smoothing,
            running: false,
        }
    }

    /// Resume ticking (no-op when already running)
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance the displayed position by one frame
    ///
    /// Returns whether the displayed position changed.
    pub fn tick(&self, state: &mut PlaybackState, now: Instant) -> bool {
        if !self.running
            || !state.is_playing
            || state.is_seek_in_progress()
            || state.is_paused_by_engine
            || state.duration_seconds <= 0.0
        {
            return false;
        }
        let Some(sampled_at) = state.last_engine_sample_timestamp else {
            return false;
        };

        let duration = state.duration_seconds;
        let elapsed = now
            .saturating_duration_since(sampled_at)
            .min(self.max_step)
            .as_secs_f64();
        let target = (state.last_engine_visible_position + elapsed).min(duration);

        let previous = state.last_displayed_position;
        let eased = previous + (target - previous) * self.smoothing;
        let next = eased.max(previous).clamp(0.0, duration);

        if next == previous {
            return false;
        }
        trace!(position = next, target, "Clock tick");
        state.last_displayed_position = next;
        true
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up
///
/// Negative and non-finite values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
