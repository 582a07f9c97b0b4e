//! Read-only track catalog
//!
//! The playback engine only ever reads the catalog: it looks tracks up by
//! index (the catalog's canonical order) or by path.

use crate::error::{CoreError, Result};
use crate::types::Track;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered, read-only collection of tracks
pub trait TrackCatalog {
    /// All tracks in catalog order
    fn tracks(&self) -> &[Track];

    /// Position of the track with this path
    fn index_of(&self, path: &Path) -> Option<usize>;

    /// Track at index
    fn get(&self, index: usize) -> Option<&Track> {
        self.tracks().get(index)
    }

    /// Number of tracks
    fn len(&self) -> usize {
        self.tracks().len()
    }

    /// Check if the catalog is empty
    fn is_empty(&self) -> bool {
        self.tracks().is_empty()
    }

    /// Track with this path
    fn find(&self, path: &Path) -> Option<&Track> {
        self.index_of(path).and_then(|index| self.get(index))
    }
}

/// In-memory catalog with a path index
#[derive(Debug, Clone, Default)]
pub struct Library {
    tracks: Vec<Track>,
    by_path: HashMap<PathBuf, usize>,
}

impl Library {
    /// Build a library, rejecting duplicate paths
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let mut by_path = HashMap::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            if by_path.insert(track.path.clone(), index).is_some() {
                return Err(CoreError::DuplicateTrack(track.path.clone()));
            }
        }

        debug!(tracks = tracks.len(), "Library built");
        Ok(Self { tracks, by_path })
    }

}

impl TrackCatalog for Library {
    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn index_of(&self, path: &Path) -> Option<usize> {
        self.by_path.get(path).copied()
    }
}
