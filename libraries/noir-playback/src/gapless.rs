//! Gapless preloading
//!
//! Once the remaining time of the current track drops to the threshold,
//! the next track is chosen with a selector dry run and handed to the engine
//! for preloading. This happens at most once per track. When the engine
//! later reports `gapless_transition`, the preloaded choice becomes the
//! current track without any play command.

use crate::queue::PlaybackQueue;
use crate::selector::{self, Selection};
use crate::state::PlaybackState;
use noir_core::TrackCatalog;
use rand::Rng;
use std::path::PathBuf;
use tracing::{debug, info};

/// Decides when and what to preload
#[derive(Debug, Clone)]
pub struct GaplessController {
    enabled: bool,
    threshold_secs: f64,
}

impl GaplessController {
    pub fn new(enabled: bool, threshold_secs: f64) -> Self {
        Self {
            enabled,
            threshold_secs,
        }
    }

    /// Whether the current sample crosses the preload threshold
    pub fn should_preload(&self, state: &PlaybackState) -> bool {
        self.enabled
            && !state.gapless_preload_armed
            && state
                .remaining()
                .is_some_and(|remaining| remaining <= self.threshold_secs)
    }

    /// Arm the preload for the current track
    ///
    /// Returns the path the engine should preload, if there is a next track.
    /// The preload is armed even when there is nothing to preload, so the
    /// dry run is not repeated on every sample.
    pub fn prepare<C, Q, R>(
        &self,
        state: &mut PlaybackState,
        queue: &Q,
        catalog: &C,
        rng: &mut R,
    ) -> Option<PathBuf>
    where
        C: TrackCatalog + ?Sized,
        Q: PlaybackQueue + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.should_preload(state) {
            return None;
        }

        state.gapless_preload_armed = true;
        let selection = selector::peek_after_end(state, queue, catalog, state.repeat_mode, rng);
        state.preloaded_next = selection;

        let Some(selection) = selection else {
            debug!("Nothing to preload after current track");
            return None;
        };
        let path = catalog.get(selection.index)?.path.clone();
        info!(path = %path.display(), source = ?selection.source, "Preloading next track");
        Some(path)
    }

    /// Track the engine just switched to
    ///
    /// Uses the preloaded choice when there is one, otherwise runs a fresh
    /// dry run. The caller commits the returned selection.
    pub fn transition_target<C, Q, R>(
        &self,
        state: &mut PlaybackState,
        queue: &Q,
        catalog: &C,
        rng: &mut R,
    ) -> Option<Selection>
    where
        C: TrackCatalog + ?Sized,
        Q: PlaybackQueue + ?Sized,
        R: Rng + ?Sized,
    {
        if let Some(selection) = state.preloaded_next.take() {
            return Some(selection);
        }
        debug!("Gapless transition without a recorded preload, selecting now");
        selector::peek_after_end(state, queue, catalog, state.repeat_mode, rng)
    }
}
