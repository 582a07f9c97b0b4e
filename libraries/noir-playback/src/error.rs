//! Error types for playback management

use crate::engine::EngineError;
use noir_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// The current track's duration is not known yet
    #[error("Track duration unknown")]
    UnknownDuration,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Track is not part of the catalog
    #[error("Track not found: {0:?}")]
    TrackNotFound(PathBuf),

    /// Engine command failed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Core(#[from] CoreError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The playback service has shut down
    #[error("Playback service closed")]
    ServiceClosed,

    /// The engine event channel is full
    #[error("Engine event channel full")]
    EventChannelFull,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
