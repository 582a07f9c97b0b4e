//! Native audio engine interface
//!
//! The engine decodes and outputs audio in its own process. It accepts
//! fire-and-forget commands and pushes events back asynchronously; the
//! events are the only authority on what is actually playing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Load and start a file
    Play { path: PathBuf },

    /// Pause output
    Pause,

    /// Resume output
    Resume,

    /// Seek to position (in seconds)
    Seek { position: f64 },

    /// Set output gain (0.0-1.0)
    SetVolume { level: f32 },

    /// Decode the next file ahead of time for a gapless hand-off
    PreloadNext { path: PathBuf },

    /// Stop output and release the current file
    Stop,
}

impl EngineCommand {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Play { .. } => "play",
            EngineCommand::Pause => "pause",
            EngineCommand::Resume => "resume",
            EngineCommand::Seek { .. } => "seek",
            EngineCommand::SetVolume { .. } => "set_volume",
            EngineCommand::PreloadNext { .. } => "preload_next",
            EngineCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Play { path } | EngineCommand::PreloadNext { path } => {
                write!(f, "{}({})", self.name(), path.display())
            }
            EngineCommand::Seek { position } => write!(f, "seek({position:.2}s)"),
            EngineCommand::SetVolume { level } => write!(f, "set_volume({level:.3})"),
            _ => f.write_str(self.name()),
        }
    }
}

/// Source vs output format reported when a file starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSpecs {
    pub source_sample_rate: u32,
    pub source_bit_depth: u8,
    pub source_channels: u16,
    pub output_sample_rate: u32,
    pub output_channels: u16,
    pub is_mismatch: bool,
}

/// Engine-reported playback error code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlaybackErrorCode {
    /// The file could not be probed (unknown or corrupt container)
    FileProbeFailed,

    /// Decoding failed mid-stream
    DecodeFailed,

    /// The file does not exist anymore
    FileNotFound,

    /// Any other engine code (device errors and the like)
    Other(String),
}

impl PlaybackErrorCode {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            PlaybackErrorCode::FileProbeFailed => "file_probe_failed",
            PlaybackErrorCode::DecodeFailed => "decode_failed",
            PlaybackErrorCode::FileNotFound => "file_not_found",
            PlaybackErrorCode::Other(code) => code,
        }
    }

    /// Whether playback should move on to the next track
    ///
    /// Only errors that make the whole file unplayable skip it.
    pub fn skips_track(&self) -> bool {
        matches!(
            self,
            PlaybackErrorCode::FileNotFound | PlaybackErrorCode::FileProbeFailed
        )
    }
}

impl From<String> for PlaybackErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "file_probe_failed" => PlaybackErrorCode::FileProbeFailed,
            "decode_failed" => PlaybackErrorCode::DecodeFailed,
            "file_not_found" => PlaybackErrorCode::FileNotFound,
            _ => PlaybackErrorCode::Other(code),
        }
    }
}

impl From<&str> for PlaybackErrorCode {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<PlaybackErrorCode> for String {
    fn from(code: PlaybackErrorCode) -> Self {
        match code {
            PlaybackErrorCode::Other(code) => code,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PlaybackErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events pushed by the engine
///
/// Delivered in arrival order; their order relative to issued commands is
/// not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Position sample, roughly every 100 ms while playing (seconds)
    Progress { position: f64, duration: f64 },

    /// The engine started seeking (possibly on its own, e.g. after a device change)
    Seeking { target: f64 },

    /// Output paused
    Paused,

    /// Output resumed
    Resumed,

    /// Current file reached its end
    Ended,

    /// The engine switched to the preloaded file without a gap
    GaplessTransition,

    /// Source/output format of the file that just started
    AudioSpecs(AudioSpecs),

    /// Playback error
    Error {
        code: PlaybackErrorCode,
        message: String,
        #[serde(default)]
        details: String,
    },
}

/// Engine command failures
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine refused or failed the command
    #[error("{command} rejected: {reason}")]
    Rejected {
        command: &'static str,
        reason: String,
    },

    /// The engine is not reachable
    #[error("Audio engine unavailable")]
    Unavailable,
}

/// Result type for engine commands
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result of a dispatched command, fed back to the playback manager
#[derive(Debug)]
pub struct CommandOutcome {
    pub command: EngineCommand,
    pub result: EngineResult<()>,
}

/// Asynchronous command surface of the native engine
///
/// Calls may complete after arbitrary latency. A successful return only
/// means the engine accepted the command; the effect is trusted once an
/// `EngineEvent` confirms it.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    async fn play(&self, path: &Path) -> EngineResult<()>;

    async fn pause(&self) -> EngineResult<()>;

    async fn resume(&self) -> EngineResult<()>;

    /// Seek to position (in seconds)
    async fn seek(&self, position: f64) -> EngineResult<()>;

    /// Set output gain (0.0-1.0)
    async fn set_volume(&self, level: f32) -> EngineResult<()>;

    async fn preload_next(&self, path: &Path) -> EngineResult<()>;

    async fn stop(&self) -> EngineResult<()>;

    /// Route a queued command to the matching method
    async fn execute(&self, command: &EngineCommand) -> EngineResult<()> {
        match command {
            EngineCommand::Play { path } => self.play(path).await,
            EngineCommand::Pause => self.pause().await,
            EngineCommand::Resume => self.resume().await,
            EngineCommand::Seek { position } => self.seek(*position).await,
            EngineCommand::SetVolume { level } => self.set_volume(*level).await,
            EngineCommand::PreloadNext { path } => self.preload_next(path).await,
            EngineCommand::Stop => self.stop().await,
        }
    }
}
