//! Seek reconciliation
//!
//! A seek forces the displayed position to the target immediately. Until
//! the engine reports a position within tolerance of the target, samples
//! are considered stale (they predate the seek) and are discarded. If no
//! confirming sample arrives before the safety deadline, the seek is
//! abandoned and interpolation resumes from the displayed position.

use crate::state::{PlaybackState, SeekPhase};
use crate::timers::{TimerKind, Timers};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What to do with an incoming position sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleVerdict {
    /// No seek in flight; apply the sample normally
    NotSeeking,

    /// The sample confirmed the pending seek and has been applied
    Confirmed { position: f64 },

    /// The sample predates the seek and must be ignored
    Stale,
}

/// Seek state machine over `PlaybackState`
#[derive(Debug, Clone)]
pub struct SeekCoordinator {
    tolerance: f64,
    safety_timeout: Duration,
}

impl SeekCoordinator {
    pub fn new(tolerance: f64, safety_timeout: Duration) -> Self {
        Self {
            tolerance,
            safety_timeout,
        }
    }

    /// Start a user seek to `target` seconds
    ///
    /// Any previous pending seek is superseded along with its deadline.
    pub fn request(
        &self,
        state: &mut PlaybackState,
        timers: &mut Timers,
        target: f64,
        now: Instant,
    ) {
        self.begin(state, timers, target, SeekPhase::Requested, now);
    }

    /// The engine announced a seek on its own
    pub fn engine_seeking(
        &self,
        state: &mut PlaybackState,
        timers: &mut Timers,
        target: f64,
        now: Instant,
    ) {
        self.begin(state, timers, target, SeekPhase::AwaitingConfirmation, now);
    }

    fn begin(
        &self,
        state: &mut PlaybackState,
        timers: &mut Timers,
        target: f64,
        phase: SeekPhase,
        now: Instant,
    ) {
        let target = if state.duration_seconds > 0.0 {
            target.clamp(0.0, state.duration_seconds)
        } else {
            target.max(0.0)
        };

        state.seek_phase = phase;
        state.seek_target_position = target;
        state.last_displayed_position = target;
        state.last_engine_visible_position = target;
        state.last_engine_sample_timestamp = Some(now);
        timers.arm(TimerKind::SeekSafety, now, self.safety_timeout);
        debug!(target, ?phase, "Seek started");
    }

    /// The seek command was delivered to the engine (successfully or not)
    pub fn command_settled(&self, state: &mut PlaybackState) {
        if state.seek_phase == SeekPhase::Requested {
            state.seek_phase = SeekPhase::AwaitingConfirmation;
        }
    }

    /// Reconcile an engine sample against the pending seek
    pub fn reconcile(
        &self,
        state: &mut PlaybackState,
        timers: &mut Timers,
        position: f64,
        now: Instant,
    ) -> SampleVerdict {
        if !state.is_seek_in_progress() {
            return SampleVerdict::NotSeeking;
        }

        let target = state.seek_target_position;
        if (position - target).abs() >= self.tolerance {
            debug!(position, target, "Discarding stale sample during seek");
            return SampleVerdict::Stale;
        }

        state.seek_phase = SeekPhase::Idle;
        state.last_engine_visible_position = position;
        state.last_engine_sample_timestamp = Some(now);
        state.last_displayed_position = position;
        timers.cancel(TimerKind::SeekSafety);
        debug!(position, target, "Seek confirmed");
        SampleVerdict::Confirmed { position }
    }

    /// Safety deadline expired without a confirming sample
    ///
    /// Returns the position interpolation resumes from, or `None` if no
    /// seek was pending.
    pub fn expire(&self, state: &mut PlaybackState, now: Instant) -> Option<f64> {
        if !state.is_seek_in_progress() {
            return None;
        }

        let position = state.last_displayed_position;
        warn!(
            target = state.seek_target_position,
            "Seek not confirmed in time, resuming from displayed position"
        );
        state.seek_phase = SeekPhase::Idle;
        state.last_engine_visible_position = position;
        state.last_engine_sample_timestamp = Some(now);
        Some(position)
    }
}
