//! Noir Player - Playback Synchronization
//!
//! Keeps the UI in step with a native audio engine that runs out of process
//! and only talks through asynchronous commands and events.
//!
//! This crate provides:
//! - Position clock (60 Hz interpolation between ~10 Hz engine samples)
//! - Seek reconciliation (stale sample rejection, safety timeout)
//! - Track selection (queue, repeat, album/library shuffle, album order)
//! - Gapless preloading and transitions
//! - Play/pause toggle debouncing and error handling
//! - Volume control (logarithmic, 0-100%, mute)
//!
//! # Architecture
//!
//! `PlaybackManager` is synchronous and deterministic: every entry point
//! takes the current `Instant` and produces engine commands and player
//! events in outboxes. `PlaybackService` runs it on tokio, dispatches the
//! commands to an `AudioEngine` and publishes events and snapshots.
//!
//! # Example: Driving the manager directly
//!
//! ```rust
//! use noir_core::{Library, Track, TrackMetadata};
//! use noir_playback::{EngineCommand, EngineEvent, PlaybackConfig, PlaybackManager, PlayerPhase};
//! use tokio::time::Instant;
//!
//! let library = Library::new(vec![Track::new(
//!     "/music/Album/01.flac",
//!     TrackMetadata::default(),
//! )])
//! .unwrap();
//!
//! let mut manager = PlaybackManager::new(PlaybackConfig::default(), library);
//! manager.play_index(0).unwrap();
//! assert!(matches!(
//!     manager.drain_commands().as_slice(),
//!     [EngineCommand::Play { .. }]
//! ));
//!
//! // The engine confirms with its first position sample
//! manager.handle_engine_event(
//!     EngineEvent::Progress { position: 0.1, duration: 180.0 },
//!     Instant::now(),
//! );
//! assert_eq!(manager.phase(), PlayerPhase::Playing);
//! ```
//!
//! # Example: Running the service
//!
//! ```rust,no_run
//! use noir_core::Library;
//! use noir_playback::{AudioEngine, PlaybackConfig, PlaybackManager, PlaybackService};
//! use std::sync::Arc;
//!
//! # async fn run(engine: Arc<dyn AudioEngine>) -> noir_playback::Result<()> {
//! let config = PlaybackConfig::load(None)?;
//! let manager = PlaybackManager::new(config, Library::default());
//! let service = PlaybackService::spawn(manager, engine);
//!
//! let handle = service.handle();
//! handle.play_index(0).await?;
//! let position = handle.displayed_position();
//! # let _ = position;
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gapless;
pub mod manager;
pub mod queue;
pub mod seek;
pub mod selector;
pub mod service;
pub mod shuffle;
pub mod state;
pub mod timers;
pub mod types;
pub mod volume;

pub use clock::{format_time, PositionClock};
pub use config::PlaybackConfig;
pub use engine::{
    AudioEngine, AudioSpecs, CommandOutcome, EngineCommand, EngineError, EngineEvent,
    EngineResult, PlaybackErrorCode,
};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackSnapshot, PlayerEvent};
pub use manager::{PlaybackManager, ToggleAction};
pub use queue::{PlaybackQueue, Queue};
pub use service::{EngineEventSender, PlaybackHandle, PlaybackService};
pub use state::{PlaybackState, SeekPhase};
pub use types::{AudioQuality, PlayerPhase, RepeatMode, ShuffleMode};
pub use volume::Volume;
