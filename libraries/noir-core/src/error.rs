//! Error types for the track catalog

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two catalog entries share the same path
    #[error("Duplicate track path: {0:?}")]
    DuplicateTrack(PathBuf),
}
