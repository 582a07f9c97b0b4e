//! Playback manager - main playback controller
//!
//! Owns the playback state and every component operating on it. Nothing in
//! here performs I/O: entry points take the current instant, mutate state
//! and queue engine commands and UI events, which the owner drains with
//! `drain_commands()` / `drain_events()`.
//!
//! The engine is the only authority on what is playing. User actions set
//! optimistic flags at most; engine events decide the phase.

use crate::clock::PositionClock;
use crate::config::PlaybackConfig;
use crate::engine::{AudioSpecs, CommandOutcome, EngineCommand, EngineEvent, PlaybackErrorCode};
use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackSnapshot, PlayerEvent};
use crate::gapless::GaplessController;
use crate::queue::{PlaybackQueue, Queue};
use crate::seek::{SampleVerdict, SeekCoordinator};
use crate::selector::{self, SelectionSource};
use crate::state::PlaybackState;
use crate::timers::{TimerKind, TimerToken, Timers};
use crate::types::{AudioQuality, PlayerPhase, RepeatMode, ShuffleMode};
use crate::volume::Volume;
use noir_core::{Library, Track, TrackCatalog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Catalog shared with the manager
pub type SharedCatalog = Box<dyn TrackCatalog + Send + Sync>;

/// Action a play/pause toggle resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Nothing loaded: start playing
    Start,
    Pause,
    Resume,
}

#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    action: ToggleAction,
    token: TimerToken,
}

/// Main playback controller
pub struct PlaybackManager {
    config: PlaybackConfig,
    state: PlaybackState,
    catalog: SharedCatalog,
    queue: Queue,
    volume: Volume,

    clock: PositionClock,
    seek: SeekCoordinator,
    gapless: GaplessController,
    timers: Timers,
    rng: StdRng,

    pending_toggle: Option<PendingToggle>,
    /// Unplayable tracks skipped in a row
    consecutive_failures: usize,
    /// Last time each error code was shown to the user
    last_notice: HashMap<PlaybackErrorCode, Instant>,

    pending_commands: Vec<EngineCommand>,
    pending_events: Vec<PlayerEvent>,
}

impl PlaybackManager {
    /// Create new playback manager over `catalog`
    pub fn new(config: PlaybackConfig, catalog: impl TrackCatalog + Send + Sync + 'static) -> Self {
        Self {
            state: PlaybackState::new(config.shuffle, config.repeat),
            catalog: Box::new(catalog),
            queue: Queue::new(),
            volume: Volume::new(config.volume),
            clock: PositionClock::new(config.max_interpolation_step(), config.smoothing_factor),
            seek: SeekCoordinator::new(config.seek_tolerance_secs, config.seek_safety_timeout()),
            gapless: GaplessController::new(
                config.gapless_enabled,
                config.gapless_preload_threshold_secs,
            ),
            timers: Timers::new(),
            rng: StdRng::from_entropy(),
            pending_toggle: None,
            consecutive_failures: 0,
            last_notice: HashMap::new(),
            pending_commands: Vec::new(),
            pending_events: Vec::new(),
            config,
        }
    }

    /// Create a manager over an in-memory library built from `tracks`
    pub fn from_tracks(config: PlaybackConfig, tracks: Vec<Track>) -> Result<Self> {
        let library = Library::new(tracks)?;
        Ok(Self::new(config, library))
    }

    /// Use a fixed shuffle seed (reproducible shuffle order)
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the catalog after a library rescan
    ///
    /// The current index is kept; if it no longer matches, selection falls
    /// back to plain catalog order.
    pub fn set_catalog(&mut self, catalog: impl TrackCatalog + Send + Sync + 'static) {
        self.catalog = Box::new(catalog);
        self.state.disarm_preload();
        info!(tracks = self.catalog.len(), "Catalog replaced");
    }

    /// Push the current volume to the engine (call once the engine is up)
    pub fn sync_engine(&mut self) {
        self.pending_commands.push(EngineCommand::SetVolume {
            level: self.volume.gain(),
        });
    }

    // ===== Playback Control =====

    /// Start playing the catalog entry at `index`
    pub fn play_index(&mut self, index: usize) -> Result<()> {
        if self.catalog.get(index).is_none() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        selector::record_served(&mut self.state, self.catalog.as_ref(), index);
        self.load_track(index);
        Ok(())
    }

    /// Play/pause toggle
    ///
    /// The action is resolved from the engine-confirmed phase. A repeat of
    /// the same action inside the debounce window is dropped. Returns the
    /// action taken, if any.
    pub fn request_toggle(&mut self, now: Instant) -> Option<ToggleAction> {
        let action = match self.state.phase {
            PlayerPhase::Playing | PlayerPhase::Loading => ToggleAction::Pause,
            PlayerPhase::Paused => ToggleAction::Resume,
            PlayerPhase::Stopped => ToggleAction::Start,
        };

        if let Some(pending) = self.pending_toggle {
            if pending.action == action && self.timers.is_current(pending.token) {
                debug!(?action, "Dropping repeated toggle");
                return None;
            }
        }

        match action {
            ToggleAction::Start => {
                let replay = self
                    .state
                    .current_track_index
                    .filter(|&index| self.catalog.get(index).is_some());
                match replay {
                    Some(index) => self.load_track(index),
                    None => {
                        if self.advance(RepeatMode::Off).is_none() {
                            debug!("Nothing to play");
                            return None;
                        }
                    }
                }
            }
            ToggleAction::Pause => {
                self.state.is_playing = false;
                self.pending_commands.push(EngineCommand::Pause);
            }
            ToggleAction::Resume => {
                self.state.is_playing = true;
                self.pending_commands.push(EngineCommand::Resume);
            }
        }

        let token = self
            .timers
            .arm(TimerKind::ToggleDebounce, now, self.config.toggle_debounce());
        self.pending_toggle = Some(PendingToggle { action, token });
        debug!(?action, "Toggle");
        Some(action)
    }

    /// Skip to the next track
    ///
    /// Returns the index now loading, or `None` when playback ended.
    pub fn request_next(&mut self) -> Option<usize> {
        let index = self.advance(self.state.repeat_mode);
        if index.is_none() {
            self.finish_playback(true);
        }
        index
    }

    /// Go to previous track
    ///
    /// Past the restart threshold, restarts the current track instead.
    pub fn request_previous(&mut self, now: Instant) -> Result<()> {
        let current = self
            .state
            .current_track_index
            .ok_or(PlaybackError::NoTrackLoaded)?;

        if self.state.last_displayed_position > self.config.previous_restart_threshold_secs {
            return self.restart_current(current, now);
        }

        match selector::previous(&self.state, self.catalog.as_ref(), self.state.repeat_mode) {
            Some(index) => self.play_index(index),
            None => self.restart_current(current, now),
        }
    }

    fn restart_current(&mut self, current: usize, now: Instant) -> Result<()> {
        if self.state.duration_seconds > 0.0 {
            self.seek_to(0.0, now).map(|_| ())
        } else {
            self.play_index(current)
        }
    }

    /// Seek to a fraction (0.0-1.0) of the current track
    ///
    /// Returns the target position in seconds.
    pub fn request_seek(&mut self, fraction: f64, now: Instant) -> Result<f64> {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        self.seek_to(fraction * self.state.duration_seconds, now)
    }

    /// Seek to an absolute position (seconds)
    pub fn seek_to(&mut self, position: f64, now: Instant) -> Result<f64> {
        if self.state.current_track_index.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if self.state.duration_seconds <= 0.0 {
            return Err(PlaybackError::UnknownDuration);
        }

        self.seek
            .request(&mut self.state, &mut self.timers, position, now);
        let target = self.state.seek_target_position;
        self.pending_commands
            .push(EngineCommand::Seek { position: target });
        self.pending_events.push(PlayerEvent::SeekStarted { target });
        Ok(target)
    }

    /// Stop playback
    ///
    /// Stops output and clears per-track state; the current index and the
    /// queue are kept.
    pub fn stop(&mut self) {
        info!("Stopping playback");
        self.cancel_track_timers();
        self.timers.cancel(TimerKind::ToggleDebounce);
        self.pending_toggle = None;
        self.state.reset_for_new_track();
        self.state.is_playing = false;
        self.clock.stop();
        self.pending_commands.push(EngineCommand::Stop);
        self.set_phase(PlayerPhase::Stopped);
    }

    // ===== Modes =====

    /// Advance shuffle off → album → library → off
    pub fn cycle_shuffle(&mut self) -> ShuffleMode {
        let mode = self.state.shuffle_mode.cycled();
        self.set_shuffle(mode);
        mode
    }

    pub fn set_shuffle(&mut self, mode: ShuffleMode) {
        if self.state.shuffle_mode == mode {
            return;
        }
        self.state.shuffle_mode = mode;
        self.state.shuffle_history.clear();
        self.state.disarm_preload();
        info!(?mode, "Shuffle mode changed");
        self.emit_modes_changed();
    }

    /// Advance repeat off → all → one → off
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        let mode = self.state.repeat_mode.cycled();
        self.set_repeat(mode);
        mode
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        if self.state.repeat_mode == mode {
            return;
        }
        self.state.repeat_mode = mode;
        self.state.disarm_preload();
        info!(?mode, "Repeat mode changed");
        self.emit_modes_changed();
    }

    // ===== Queue Management =====

    /// Add a catalog track to the end of the queue
    pub fn enqueue(&mut self, path: &Path) -> Result<()> {
        let path = self.require_path(path)?;
        self.queue.add_to_end(path);
        self.on_queue_changed();
        Ok(())
    }

    /// Add a catalog track in front of the queue
    pub fn enqueue_next(&mut self, path: &Path) -> Result<()> {
        let path = self.require_path(path)?;
        self.queue.add_next(path);
        self.on_queue_changed();
        Ok(())
    }

    /// Remove a queued track by position
    pub fn remove_from_queue(&mut self, index: usize) -> Result<PathBuf> {
        let removed = self
            .queue
            .remove(index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.on_queue_changed();
        Ok(removed)
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.on_queue_changed();
    }

    fn require_path(&self, path: &Path) -> Result<PathBuf> {
        self.catalog
            .find(path)
            .map(|track| track.path.clone())
            .ok_or_else(|| PlaybackError::TrackNotFound(path.to_path_buf()))
    }

    fn on_queue_changed(&mut self) {
        // The preloaded choice may no longer be the queue head
        self.state.disarm_preload();
        self.emit_queue_changed();
    }

    // ===== Volume Control =====

    /// Set volume level (0-100)
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.push_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.push_volume();
    }

    fn push_volume(&mut self) {
        debug!(
            level = self.volume.level(),
            muted = self.volume.is_muted(),
            db = self.volume.to_db(),
            "Volume changed"
        );
        self.pending_commands.push(EngineCommand::SetVolume {
            level: self.volume.gain(),
        });
        self.pending_events.push(PlayerEvent::VolumeChanged {
            level: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }

    // ===== Engine Feedback =====

    /// Apply an event pushed by the engine
    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        trace!(?event, "Engine event");
        match event {
            EngineEvent::Progress { position, duration } => {
                self.on_progress(position, duration, now);
            }
            EngineEvent::Seeking { target } => self.on_engine_seeking(target, now),
            EngineEvent::Paused => self.on_paused(),
            EngineEvent::Resumed => self.on_resumed(now),
            EngineEvent::Ended => self.on_ended(now),
            EngineEvent::GaplessTransition => self.on_gapless_transition(now),
            EngineEvent::AudioSpecs(specs) => self.on_audio_specs(specs),
            EngineEvent::Error {
                code,
                message,
                details,
            } => self.on_error(code, message, &details, now),
        }
    }

    /// Apply the outcome of a dispatched command
    pub fn on_command_outcome(&mut self, outcome: CommandOutcome) {
        let CommandOutcome { command, result } = outcome;

        if let EngineCommand::Seek { .. } = command {
            self.seek.command_settled(&mut self.state);
        }

        let Err(error) = result else {
            trace!(%command, "Command accepted");
            return;
        };

        match command {
            EngineCommand::Seek { position } => {
                warn!(position, %error, "Seek command failed, keeping requested position");
            }
            EngineCommand::Pause | EngineCommand::Resume => {
                warn!(%command, %error, "Toggle command failed");
                self.clear_pending_toggle();
                self.state.is_playing =
                    self.state.phase == PlayerPhase::Playing && !self.state.is_paused_by_engine;
            }
            EngineCommand::PreloadNext { ref path } => {
                warn!(path = %path.display(), %error, "Preload failed, next track will load normally");
                self.state.preloaded_next = None;
            }
            _ => warn!(%command, %error, "Engine command failed"),
        }
    }

    fn on_progress(&mut self, position: f64, duration: f64, now: Instant) {
        if self.state.phase == PlayerPhase::Stopped || self.state.current_track_index.is_none() {
            trace!(position, "Ignoring progress while stopped");
            return;
        }
        if !position.is_finite() {
            return;
        }
        if duration.is_finite() && duration > 0.0 {
            self.state.duration_seconds = duration;
        }
        self.consecutive_failures = 0;

        match self
            .seek
            .reconcile(&mut self.state, &mut self.timers, position, now)
        {
            SampleVerdict::Stale => return,
            SampleVerdict::Confirmed { position } => {
                self.pending_events.push(PlayerEvent::SeekSettled {
                    position,
                    confirmed: true,
                });
            }
            SampleVerdict::NotSeeking => {
                let position = if self.state.duration_seconds > 0.0 {
                    position.clamp(0.0, self.state.duration_seconds)
                } else {
                    position.max(0.0)
                };
                self.state.last_engine_visible_position = position;
                self.state.last_engine_sample_timestamp = Some(now);
            }
        }

        if self.state.phase == PlayerPhase::Loading && !self.state.is_paused_by_engine {
            self.state.is_playing = true;
            self.set_phase(PlayerPhase::Playing);
        }
        self.clock.start();

        if let Some(path) = self.gapless.prepare(
            &mut self.state,
            &self.queue,
            self.catalog.as_ref(),
            &mut self.rng,
        ) {
            self.pending_commands
                .push(EngineCommand::PreloadNext { path: path.clone() });
            self.pending_events
                .push(PlayerEvent::PreloadRequested { path });
        }
    }

    fn on_engine_seeking(&mut self, target: f64, now: Instant) {
        if self.state.current_track_index.is_none() {
            return;
        }
        self.seek
            .engine_seeking(&mut self.state, &mut self.timers, target, now);
        self.pending_events.push(PlayerEvent::SeekStarted {
            target: self.state.seek_target_position,
        });
    }

    fn on_paused(&mut self) {
        if self.state.current_track_index.is_none() {
            return;
        }
        self.state.is_paused_by_engine = true;
        self.state.is_playing = false;
        self.clear_pending_toggle();
        self.set_phase(PlayerPhase::Paused);
    }

    fn on_resumed(&mut self, now: Instant) {
        if self.state.current_track_index.is_none() {
            return;
        }
        self.state.is_paused_by_engine = false;
        self.state.is_playing = true;
        // Interpolate from the resume instant, not from before the pause
        if self.state.last_engine_sample_timestamp.is_some() {
            self.state.last_engine_sample_timestamp = Some(now);
        }
        self.clear_pending_toggle();
        self.clock.start();
        self.set_phase(PlayerPhase::Playing);
    }

    fn on_ended(&mut self, now: Instant) {
        let Some(index) = self.state.current_track_index else {
            return;
        };
        info!(index, "Track ended");
        self.pending_events.push(PlayerEvent::TrackFinished { index });

        self.cancel_track_timers();
        self.state.reset_for_new_track();
        self.set_phase(PlayerPhase::Loading);
        self.timers
            .arm(TimerKind::AdvanceGrace, now, self.config.advance_grace());
    }

    fn on_gapless_transition(&mut self, now: Instant) {
        let previous = self.state.current_track_index;
        let Some(selection) = self.gapless.transition_target(
            &mut self.state,
            &self.queue,
            self.catalog.as_ref(),
            &mut self.rng,
        ) else {
            warn!("Gapless transition reported but no next track is known");
            return;
        };
        let Some(track) = self.catalog.get(selection.index) else {
            return;
        };
        let duration = track.duration_secs();
        info!(index = selection.index, path = %track.path.display(), "Gapless transition");

        selector::commit(
            &mut self.state,
            &mut self.queue,
            self.catalog.as_ref(),
            selection,
        );
        if selection.source == SelectionSource::Queue {
            self.emit_queue_changed();
        }

        self.cancel_track_timers();
        self.state.reset_for_new_track();
        self.state.current_track_index = Some(selection.index);
        self.state.duration_seconds = duration;
        self.state.last_engine_sample_timestamp = Some(now);
        self.state.is_playing = true;
        self.clock.start();

        self.pending_events.push(PlayerEvent::TrackChanged {
            index: selection.index,
            previous_index: previous,
            gapless: true,
        });
        self.set_phase(PlayerPhase::Playing);
    }

    fn on_audio_specs(&mut self, specs: AudioSpecs) {
        let quality = if specs.is_mismatch {
            AudioQuality::Resampled {
                source_rate: specs.source_sample_rate,
                output_rate: specs.output_sample_rate,
            }
        } else {
            AudioQuality::BitPerfect {
                sample_rate: specs.source_sample_rate,
                bit_depth: specs.source_bit_depth,
            }
        };

        if quality != self.state.audio_quality {
            info!(?quality, channels = specs.source_channels, "Audio format");
            self.state.audio_quality = quality;
            self.pending_events
                .push(PlayerEvent::QualityChanged { quality });
        }
    }

    fn on_error(&mut self, code: PlaybackErrorCode, message: String, details: &str, now: Instant) {
        warn!(%code, %message, details, "Engine reported playback error");

        let window = self.config.error_notice_window();
        let surface = self
            .last_notice
            .get(&code)
            .map_or(true, |&at| now.saturating_duration_since(at) >= window);
        if surface {
            self.last_notice.insert(code.clone(), now);
            self.pending_events.push(PlayerEvent::ErrorNotice {
                code: code.clone(),
                message,
            });
        } else {
            debug!(%code, "Error notice suppressed");
        }

        if code.skips_track() && self.state.current_track_index.is_some() {
            info!(%code, delay_ms = self.config.error_advance_delay_ms, "Skipping unplayable track");
            self.timers
                .arm(TimerKind::ErrorAdvance, now, self.config.error_advance_delay());
        }
    }

    // ===== Timers and Clock =====

    /// Advance the displayed position by one frame
    pub fn tick(&mut self, now: Instant) -> bool {
        self.clock.tick(&mut self.state, now)
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Fire every timer due at `now`
    pub fn poll_timers(&mut self, now: Instant) {
        while let Some(kind) = self.timers.pop_expired(now) {
            trace!(?kind, "Timer fired");
            match kind {
                TimerKind::SeekSafety => {
                    if let Some(position) = self.seek.expire(&mut self.state, now) {
                        self.pending_events.push(PlayerEvent::SeekSettled {
                            position,
                            confirmed: false,
                        });
                    }
                }
                TimerKind::ToggleDebounce => self.pending_toggle = None,
                TimerKind::AdvanceGrace => self.advance_after_end(),
                TimerKind::ErrorAdvance => self.skip_failed_track(),
            }
        }
    }

    fn advance_after_end(&mut self) {
        // Repeat-one replays the finished track and leaves the queue alone
        if let Some(selection) =
            selector::repeat_one(&self.state, self.catalog.as_ref(), self.state.repeat_mode)
        {
            debug!(index = selection.index, "Repeating track");
            self.load_track(selection.index);
            return;
        }
        if self.advance(self.state.repeat_mode).is_none() {
            info!("End of playback");
            self.finish_playback(false);
        }
    }

    fn skip_failed_track(&mut self) {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.catalog.len() {
            warn!(
                failures = self.consecutive_failures,
                "No playable track left, stopping"
            );
            self.consecutive_failures = 0;
            self.finish_playback(true);
            return;
        }

        // Repeat-one would retry the same broken file forever
        let repeat = match self.state.repeat_mode {
            RepeatMode::One => RepeatMode::Off,
            mode => mode,
        };
        if self.advance(repeat).is_none() {
            self.finish_playback(true);
        }
    }

    // ===== Internal =====

    /// Select and load the next track
    fn advance(&mut self, repeat: RepeatMode) -> Option<usize> {
        let selection = selector::next(
            &mut self.state,
            &mut self.queue,
            self.catalog.as_ref(),
            repeat,
            &mut self.rng,
        )?;
        if selection.source == SelectionSource::Queue {
            self.emit_queue_changed();
        }
        self.load_track(selection.index);
        Some(selection.index)
    }

    fn load_track(&mut self, index: usize) {
        let Some(track) = self.catalog.get(index) else {
            warn!(index, "Track index out of range");
            return;
        };
        let path = track.path.clone();
        let duration = track.duration_secs();
        let previous = self.state.current_track_index;

        info!(index, path = %path.display(), "Loading track");
        self.cancel_track_timers();
        self.state.reset_for_new_track();
        self.state.current_track_index = Some(index);
        // Tag duration until the engine reports the real one
        self.state.duration_seconds = duration;
        self.state.is_playing = true;
        self.clock.start();

        self.pending_commands.push(EngineCommand::Play { path });
        self.pending_events.push(PlayerEvent::TrackChanged {
            index,
            previous_index: previous,
            gapless: false,
        });
        self.set_phase(PlayerPhase::Loading);
    }

    fn finish_playback(&mut self, send_stop: bool) {
        self.cancel_track_timers();
        self.state.reset_for_new_track();
        self.state.is_playing = false;
        self.clock.stop();
        if send_stop {
            self.pending_commands.push(EngineCommand::Stop);
        }
        self.set_phase(PlayerPhase::Stopped);
        self.pending_events.push(PlayerEvent::PlaybackFinished);
    }

    fn cancel_track_timers(&mut self) {
        self.timers.cancel(TimerKind::SeekSafety);
        self.timers.cancel(TimerKind::AdvanceGrace);
        self.timers.cancel(TimerKind::ErrorAdvance);
    }

    fn clear_pending_toggle(&mut self) {
        if self.pending_toggle.take().is_some() {
            self.timers.cancel(TimerKind::ToggleDebounce);
        }
    }

    fn set_phase(&mut self, phase: PlayerPhase) {
        if self.state.phase != phase {
            debug!(from = ?self.state.phase, to = ?phase, "Phase changed");
            self.state.phase = phase;
            self.pending_events.push(PlayerEvent::StateChanged { phase });
        }
    }

    // ===== State Queries =====

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlayerPhase {
        self.state.phase
    }

    pub fn displayed_position(&self) -> f64 {
        self.state.displayed_position()
    }

    pub fn duration(&self) -> f64 {
        self.state.duration()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.state.shuffle_mode
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.repeat_mode
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state
            .current_track_index
            .and_then(|index| self.catalog.get(index))
    }

    pub fn catalog(&self) -> &(dyn TrackCatalog + Send + Sync) {
        self.catalog.as_ref()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// UI projection of the current state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let path = self.current_track().map(|track| track.path.clone());
        PlaybackSnapshot {
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            queue_length: self.queue.len(),
            queue: self.queue.iter().map(Path::to_path_buf).collect(),
            ..PlaybackSnapshot::capture(&self.state, path)
        }
    }

    // ===== Outboxes =====

    /// Drain engine commands issued since the last drain, in issue order
    pub fn drain_commands(&mut self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn emit_modes_changed(&mut self) {
        self.pending_events.push(PlayerEvent::ModesChanged {
            shuffle: self.state.shuffle_mode,
            repeat: self.state.repeat_mode,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlayerEvent::QueueChanged {
            length: self.queue.len(),
        });
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("state", &self.state)
            .field("tracks", &self.catalog.len())
            .field("queue", &self.queue.len())
            .finish_non_exhaustive()
    }
}
