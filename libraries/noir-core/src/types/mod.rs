//! Core domain types

mod track;

pub use track::{Track, TrackMetadata};
