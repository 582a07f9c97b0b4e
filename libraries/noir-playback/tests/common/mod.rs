//! Shared helpers for noir-playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use noir_core::{Library, Track, TrackMetadata};
use noir_playback::{
    AudioEngine, EngineCommand, EngineError, EngineEvent, EngineResult, PlaybackConfig,
    PlaybackManager, PlayerEvent,
};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};
use tokio::time::Instant;

static INIT: Once = Once::new();

/// Route tracing output to the test harness (once per binary)
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("noir_playback=debug")),
            )
            .try_init();
    });
}

/// Track in `/music/<album>/<nn>.flac` tagged with album and number
pub fn album_track(album: &str, number: u32, duration_secs: u64) -> Track {
    Track::new(
        format!("/music/{album}/{number:02}.flac"),
        TrackMetadata {
            title: Some(format!("{album} {number}")),
            artist: Some("Artist".to_string()),
            album: Some(album.to_string()),
            track_number: Some(number),
            duration_ms: Some(duration_secs * 1000),
            ..TrackMetadata::default()
        },
    )
}

/// One album of `count` tracks, 240 s each
pub fn single_album(count: u32) -> Library {
    Library::new((1..=count).map(|n| album_track("Album", n, 240)).collect()).unwrap()
}

/// `albums` albums of `per_album` tracks each
pub fn multi_album(albums: u32, per_album: u32) -> Library {
    let tracks = (1..=albums)
        .flat_map(|a| (1..=per_album).map(move |n| album_track(&format!("Album{a}"), n, 240)))
        .collect();
    Library::new(tracks).unwrap()
}

pub fn manager(library: Library) -> PlaybackManager {
    init_tracing();
    PlaybackManager::new(PlaybackConfig::default(), library).with_seed(7)
}

pub fn progress(position: f64, duration: f64) -> EngineEvent {
    EngineEvent::Progress { position, duration }
}

/// Start `index` and confirm it with a first sample at `now`
pub fn start_playing(manager: &mut PlaybackManager, index: usize, now: Instant) {
    manager.play_index(index).unwrap();
    let duration = manager.duration();
    manager.handle_engine_event(progress(0.0, duration), now);
    manager.drain_commands();
    manager.drain_events();
}

pub fn play_commands(commands: &[EngineCommand]) -> Vec<&Path> {
    commands
        .iter()
        .filter_map(|command| match command {
            EngineCommand::Play { path } => Some(path.as_path()),
            _ => None,
        })
        .collect()
}

pub fn track_changes(events: &[PlayerEvent]) -> Vec<(usize, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::TrackChanged { index, gapless, .. } => Some((*index, *gapless)),
            _ => None,
        })
        .collect()
}

/// Engine double recording every command it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingEngine {
    commands: Arc<Mutex<Vec<EngineCommand>>>,
    reject_seeks: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_seeks() -> Self {
        Self {
            reject_seeks: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: EngineCommand) -> EngineResult<()> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

#[async_trait]
impl AudioEngine for RecordingEngine {
    async fn play(&self, path: &Path) -> EngineResult<()> {
        self.record(EngineCommand::Play {
            path: path.to_path_buf(),
        })
    }

    async fn pause(&self) -> EngineResult<()> {
        self.record(EngineCommand::Pause)
    }

    async fn resume(&self) -> EngineResult<()> {
        self.record(EngineCommand::Resume)
    }

    async fn seek(&self, position: f64) -> EngineResult<()> {
        if self.reject_seeks {
            return Err(EngineError::Rejected {
                command: "seek",
                reason: "not seekable".to_string(),
            });
        }
        self.record(EngineCommand::Seek { position })
    }

    async fn set_volume(&self, level: f32) -> EngineResult<()> {
        self.record(EngineCommand::SetVolume { level })
    }

    async fn preload_next(&self, path: &Path) -> EngineResult<()> {
        self.record(EngineCommand::PreloadNext {
            path: path.to_path_buf(),
        })
    }

    async fn stop(&self) -> EngineResult<()> {
        self.record(EngineCommand::Stop)
    }
}
