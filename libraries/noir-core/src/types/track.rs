//! Track domain type

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audio track in the catalog
///
/// The file path is the unique identifier: two tracks never share a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// File path on disk
    pub path: PathBuf,

    /// Tag metadata
    pub metadata: TrackMetadata,
}

impl Track {
    /// Create a track from a path and its metadata
    pub fn new(path: impl Into<PathBuf>, metadata: TrackMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
        }
    }

    /// Directory containing the file, if any
    pub fn folder(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// Title for display and ordering
    ///
    /// Falls back to the file stem when the title tag is missing.
    pub fn display_name(&self) -> String {
        match self.metadata.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self
                .path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// `(album, artist)` pair used to group tracks of the same release
    ///
    /// Returns `None` when the album tag is absent, so untagged files are
    /// never grouped together by metadata alone.
    pub fn album_key(&self) -> Option<(&str, &str)> {
        let album = self.metadata.album.as_deref().filter(|a| !a.is_empty())?;
        let artist = self.metadata.artist.as_deref().unwrap_or_default();
        Some((album, artist))
    }

    /// Disc number, defaulting to 1
    pub fn disc(&self) -> u32 {
        self.metadata.disc_number.unwrap_or(1)
    }

    /// Track number, defaulting to 0
    pub fn number(&self) -> u32 {
        self.metadata.track_number.unwrap_or(0)
    }

    /// Duration in seconds (0.0 when unknown)
    pub fn duration_secs(&self) -> f64 {
        self.metadata
            .duration()
            .map_or(0.0, |duration| duration.as_secs_f64())
    }
}

/// Track metadata extracted from file tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Disc number
    pub disc_number: Option<u32>,

    /// Track number
    pub track_number: Option<u32>,

    /// Duration in milliseconds
    pub duration_ms: Option<u64>,

    /// Source sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Source bit depth
    pub bit_depth: Option<u8>,
}

impl TrackMetadata {
    /// Get the duration as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    /// Set the duration from a Duration
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = Some(duration.as_millis() as u64);
    }
}
