//! Noir Player Core
//!
//! Catalog types consumed by the playback libraries.
//!
//! This crate provides:
//! - **Domain Types**: `Track` and its `TrackMetadata`
//! - **Catalog**: the read-only `TrackCatalog` trait and the in-memory `Library`
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use noir_core::{Library, Track, TrackCatalog, TrackMetadata};
//! use std::path::PathBuf;
//!
//! let track = Track::new(
//!     PathBuf::from("/music/Album/01 - Intro.flac"),
//!     TrackMetadata {
//!         title: Some("Intro".to_string()),
//!         album: Some("Album".to_string()),
//!         track_number: Some(1),
//!         duration_ms: Some(183_000),
//!         ..TrackMetadata::default()
//!     },
//! );
//!
//! let library = Library::new(vec![track]).unwrap();
//! assert_eq!(library.len(), 1);
//! assert_eq!(library.get(0).unwrap().display_name(), "Intro");
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{Library, TrackCatalog};
pub use error::{CoreError, Result};
pub use types::{Track, TrackMetadata};
