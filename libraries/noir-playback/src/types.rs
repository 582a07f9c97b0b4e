//! Core types for playback management

use serde::{Deserialize, Serialize};

/// Playback phase
///
/// Only engine events move the phase; user actions change it indirectly
/// through the commands they issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    /// No track loaded
    Stopped,

    /// Play command issued, waiting for the first progress sample
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the album/catalog ends
    #[default]
    Off,

    /// Wrap around at the end
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the UI cycle: off → all → one → off
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// No shuffling
    #[default]
    Off,

    /// Random order within the current album set
    Album,

    /// Random order over the whole library
    Library,
}

impl ShuffleMode {
    /// Next mode in the UI cycle: off → album → library → off
    pub fn cycled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::Album,
            ShuffleMode::Album => ShuffleMode::Library,
            ShuffleMode::Library => ShuffleMode::Off,
        }
    }
}

/// Bit-perfect vs resampled indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioQuality {
    /// No audio specs reported for this track yet
    #[default]
    Unknown,

    /// Output runs at the source rate
    BitPerfect {
        sample_rate: u32,
        bit_depth: u8,
    },

    /// Output is resampled
    Resampled {
        source_rate: u32,
        output_rate: u32,
    },
}
