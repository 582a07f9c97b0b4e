//! End-to-end synchronization scenarios against the playback manager
//!
//! Time is driven explicitly: every step passes its own `Instant`.

mod common;

use common::*;
use noir_core::Library;
use noir_playback::{
    selector, EngineCommand, EngineEvent, PlaybackErrorCode, PlayerEvent, PlayerPhase,
    PlaybackQueue, RepeatMode, SeekPhase, ShuffleMode,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

// ===== Position Clock =====

#[test]
fn test_displayed_position_never_decreases_with_jittery_samples() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    // Samples every ~100 ms, some arriving late and some slightly behind
    let samples = [0.1, 0.19, 0.32, 0.38, 0.52, 0.6, 0.69, 0.85];
    let mut last = manager.displayed_position();
    let mut now = start;

    for position in samples {
        for _ in 0..6 {
            now += ms(16);
            manager.tick(now);
            assert!(manager.displayed_position() >= last);
            last = manager.displayed_position();
        }
        manager.handle_engine_event(progress(position, 240.0), now);
    }

    assert!(last > 0.5 && last <= 240.0);
}

#[test]
fn test_clock_holds_while_paused() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);
    manager.handle_engine_event(progress(10.0, 240.0), start);

    manager.handle_engine_event(EngineEvent::Paused, start + ms(10));
    let frozen = manager.displayed_position();
    for frame in 1..30 {
        manager.tick(start + ms(10 + frame * 16));
    }
    assert_eq!(manager.displayed_position(), frozen);
    assert_eq!(manager.phase(), PlayerPhase::Paused);

    manager.handle_engine_event(EngineEvent::Resumed, start + ms(1000));
    manager.tick(start + ms(1100));
    assert!(manager.displayed_position() >= frozen);
    assert!(manager.is_playing());
}

// ===== Seek Coordinator =====

#[test]
fn test_seek_to_half_confirmed_by_nearby_sample() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    let target = manager.request_seek(0.5, start).unwrap();
    assert_eq!(target, 120.0);
    assert_eq!(manager.displayed_position(), 120.0);
    assert_eq!(
        manager.drain_commands(),
        vec![EngineCommand::Seek { position: 120.0 }]
    );

    manager.handle_engine_event(progress(120.4, 240.0), start + ms(120));
    assert_eq!(manager.state().seek_phase(), SeekPhase::Idle);
    assert_eq!(manager.displayed_position(), 120.4);
    assert!(manager.drain_events().contains(&PlayerEvent::SeekSettled {
        position: 120.4,
        confirmed: true
    }));
    assert!(manager.next_deadline().is_none());
}

#[test]
fn test_stale_sample_outside_tolerance_is_ignored() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);
    manager.handle_engine_event(progress(30.0, 100.0), start);

    manager.request_seek(0.5, start).unwrap();
    manager.handle_engine_event(progress(30.9, 100.0), start + ms(100));
    assert_eq!(manager.displayed_position(), 50.0);
    assert!(manager.state().is_seek_in_progress());

    manager.handle_engine_event(progress(50.0, 100.0), start + ms(200));
    assert!(!manager.state().is_seek_in_progress());
    assert_eq!(manager.displayed_position(), 50.0);
}

#[test]
fn test_newer_seek_supersedes_pending_deadline() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.request_seek(0.5, start).unwrap();
    manager.request_seek(0.25, start + ms(500)).unwrap();
    assert_eq!(manager.next_deadline(), Some(start + ms(2500)));

    // The first seek's deadline passes without effect
    manager.poll_timers(start + ms(2100));
    assert!(manager.state().is_seek_in_progress());
    assert_eq!(manager.displayed_position(), 60.0);

    manager.poll_timers(start + ms(2500));
    assert!(!manager.state().is_seek_in_progress());
    assert!(manager.drain_events().contains(&PlayerEvent::SeekSettled {
        position: 60.0,
        confirmed: false
    }));
}

#[test]
fn test_unconfirmed_seek_resumes_interpolation_from_target() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.request_seek(0.75, start).unwrap();
    for frame in 1..10 {
        manager.tick(start + ms(frame * 16));
    }
    // Clock frozen while seeking
    assert_eq!(manager.displayed_position(), 180.0);

    let expiry = start + ms(2000);
    manager.poll_timers(expiry);
    manager.tick(expiry + ms(100));
    assert!(manager.displayed_position() > 180.0);
}

#[test]
fn test_engine_initiated_seek_forces_display() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(EngineEvent::Seeking { target: 42.0 }, start);
    assert_eq!(manager.displayed_position(), 42.0);
    assert_eq!(
        manager.state().seek_phase(),
        SeekPhase::AwaitingConfirmation
    );
    assert!(manager.drain_commands().is_empty());

    manager.handle_engine_event(progress(42.3, 240.0), start + ms(100));
    assert!(!manager.state().is_seek_in_progress());
}

#[test]
fn test_seek_without_duration_is_rejected() {
    let library = noir_core::Library::new(vec![noir_core::Track::new(
        "/music/untagged.flac",
        noir_core::TrackMetadata::default(),
    )])
    .unwrap();
    let mut manager = manager(library);
    manager.play_index(0).unwrap();

    assert!(matches!(
        manager.request_seek(0.5, Instant::now()),
        Err(noir_playback::PlaybackError::UnknownDuration)
    ));
}

// ===== Track Selector =====

#[test]
fn test_sequential_next_ends_after_last_track() {
    let mut manager = manager(single_album(3));
    let now = Instant::now();
    start_playing(&mut manager, 0, now);

    assert_eq!(manager.request_next(), Some(1));
    assert_eq!(manager.request_next(), Some(2));
    manager.drain_commands();
    manager.drain_events();

    assert_eq!(manager.request_next(), None);
    assert_eq!(manager.phase(), PlayerPhase::Stopped);
    assert_eq!(manager.drain_commands(), vec![EngineCommand::Stop]);
    assert!(manager
        .drain_events()
        .contains(&PlayerEvent::PlaybackFinished));
}

#[test]
fn test_repeat_all_wraps_within_album() {
    let mut manager = manager(multi_album(2, 2));
    let now = Instant::now();
    manager.set_repeat(RepeatMode::All);
    start_playing(&mut manager, 1, now);

    assert_eq!(manager.request_next(), Some(0));
}

#[test]
fn test_album_end_continues_with_next_album() {
    let mut manager = manager(multi_album(2, 2));
    let now = Instant::now();
    start_playing(&mut manager, 1, now);

    assert_eq!(manager.request_next(), Some(2));
}

#[test]
fn test_library_shuffle_visits_every_track_once_per_cycle() {
    let tracks = 6;
    let mut manager = manager(multi_album(2, 3));
    let now = Instant::now();
    manager.set_shuffle(ShuffleMode::Library);
    start_playing(&mut manager, 0, now);

    let mut seen = HashSet::from([0]);
    for _ in 1..tracks {
        let index = manager.request_next().unwrap();
        assert!(seen.insert(index), "track {index} served twice in one cycle");
    }
    assert_eq!(seen.len(), tracks);

    // New cycle never starts with the track that just played
    let last = manager.state().current_track_index().unwrap();
    let first_of_cycle = manager.request_next().unwrap();
    assert_ne!(first_of_cycle, last);
    assert!(manager.state().shuffle_history().len() <= tracks);
}

#[test]
fn test_album_shuffle_stays_in_current_album() {
    let mut manager = manager(multi_album(3, 4));
    let now = Instant::now();
    manager.set_shuffle(ShuffleMode::Album);
    start_playing(&mut manager, 4, now);

    for _ in 0..12 {
        let index = manager.request_next().unwrap();
        assert!((4..8).contains(&index));
    }
}

#[test]
fn test_queue_has_priority_over_repeat_one() {
    let mut manager = manager(single_album(3));
    let now = Instant::now();
    manager.set_repeat(RepeatMode::One);
    start_playing(&mut manager, 0, now);
    manager
        .enqueue(Path::new("/music/Album/03.flac"))
        .unwrap();

    assert_eq!(manager.request_next(), Some(2));
    assert!(manager.queue().is_empty());
    assert_eq!(manager.request_next(), Some(2));
}

#[test]
fn test_album_shuffle_history_follows_queue_into_new_album() {
    let mut manager = manager(multi_album(2, 2));
    manager.set_shuffle(ShuffleMode::Album);
    manager.play_index(0).unwrap();
    manager
        .enqueue(Path::new("/music/Album2/01.flac"))
        .unwrap();
    manager
        .enqueue(Path::new("/music/Album2/02.flac"))
        .unwrap();

    for _ in 0..4 {
        let index = manager.request_next().unwrap();
        let pool = selector::album_set(manager.catalog(), index).len();
        assert!((2..4).contains(&index));
        assert!(
            manager.state().shuffle_history().len() <= pool,
            "history {} exceeds album of {}",
            manager.state().shuffle_history().len(),
            pool
        );
    }
}

#[test]
fn test_next_without_current_track_starts_queue_then_catalog() {
    let mut manager = manager(single_album(3));
    manager
        .enqueue(Path::new("/music/Album/02.flac"))
        .unwrap();
    assert_eq!(manager.request_next(), Some(1));

    let mut fresh = common::manager(single_album(3));
    assert_eq!(fresh.request_next(), Some(0));
}

#[test]
fn test_previous_restarts_late_and_steps_back_early() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 2, start);

    // Well into the track: restart
    manager.request_seek(0.25, start).unwrap();
    manager.handle_engine_event(progress(60.0, 240.0), start + ms(100));
    manager.drain_commands();
    manager.request_previous(start + ms(200)).unwrap();
    assert_eq!(
        manager.drain_commands(),
        vec![EngineCommand::Seek { position: 0.0 }]
    );
    assert_eq!(manager.state().current_track_index(), Some(2));

    // Confirm the restart, then go back a track
    manager.handle_engine_event(progress(0.0, 240.0), start + ms(300));
    manager.request_previous(start + ms(400)).unwrap();
    assert_eq!(manager.state().current_track_index(), Some(1));
}

// ===== Gapless =====

#[test]
fn test_preload_is_requested_once() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    for (i, position) in [200.0, 225.0, 231.0, 232.0, 235.5, 238.0].iter().enumerate() {
        manager.handle_engine_event(progress(*position, 240.0), start + ms(100 * i as u64));
    }

    let preloads: Vec<_> = manager
        .drain_commands()
        .into_iter()
        .filter(|c| matches!(c, EngineCommand::PreloadNext { .. }))
        .collect();
    assert_eq!(
        preloads,
        vec![EngineCommand::PreloadNext {
            path: PathBuf::from("/music/Album/02.flac")
        }]
    );
}

#[test]
fn test_gapless_transition_switches_without_play() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(progress(232.0, 240.0), start);
    manager.handle_engine_event(EngineEvent::GaplessTransition, start + ms(8000));

    assert_eq!(manager.state().current_track_index(), Some(1));
    assert_eq!(manager.phase(), PlayerPhase::Playing);
    assert_eq!(manager.duration(), 240.0);
    assert_eq!(manager.displayed_position(), 0.0);
    assert!(!manager.state().is_preload_armed());

    let commands = manager.drain_commands();
    assert!(play_commands(&commands).is_empty());
    assert_eq!(track_changes(&manager.drain_events()), vec![(1, true)]);

    // The new track arms its own preload later
    manager.handle_engine_event(progress(231.0, 240.0), start + ms(9000));
    assert!(manager
        .drain_commands()
        .contains(&EngineCommand::PreloadNext {
            path: PathBuf::from("/music/Album/03.flac")
        }));
}

#[test]
fn test_gapless_transition_consumes_queue_head() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);
    manager
        .enqueue(Path::new("/music/Album/03.flac"))
        .unwrap();

    manager.handle_engine_event(progress(235.0, 240.0), start);
    manager.handle_engine_event(EngineEvent::GaplessTransition, start + ms(5000));

    assert_eq!(manager.state().current_track_index(), Some(2));
    assert!(manager.queue().is_empty());
}

#[test]
fn test_mode_change_rearms_preload_with_new_choice() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(progress(235.0, 240.0), start);
    manager.drain_commands();

    manager.set_repeat(RepeatMode::One);
    manager.handle_engine_event(progress(235.1, 240.0), start + ms(100));
    assert_eq!(
        manager.drain_commands(),
        vec![EngineCommand::PreloadNext {
            path: PathBuf::from("/music/Album/01.flac")
        }]
    );
}

#[test]
fn test_preload_arms_at_exactly_ten_seconds_remaining() {
    let library = Library::new((1..=3).map(|n| album_track("Album", n, 200)).collect()).unwrap();
    let mut manager = manager(library);
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(progress(190.0, 200.0), start);
    assert_eq!(
        manager.drain_commands(),
        vec![EngineCommand::PreloadNext {
            path: PathBuf::from("/music/Album/02.flac")
        }]
    );
    manager.drain_events();

    manager.handle_engine_event(EngineEvent::GaplessTransition, start + ms(10_000));
    assert_eq!(manager.state().current_track_index(), Some(1));
    assert_eq!(manager.displayed_position(), 0.0);
    assert!(play_commands(&manager.drain_commands()).is_empty());
    assert_eq!(track_changes(&manager.drain_events()), vec![(1, true)]);
}

#[test]
fn test_repeat_one_preloads_current_track_despite_queue() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    manager.set_repeat(RepeatMode::One);
    start_playing(&mut manager, 0, start);
    manager
        .enqueue(Path::new("/music/Album/03.flac"))
        .unwrap();

    manager.handle_engine_event(progress(235.0, 240.0), start);
    assert_eq!(
        manager.drain_commands(),
        vec![EngineCommand::PreloadNext {
            path: PathBuf::from("/music/Album/01.flac")
        }]
    );

    manager.handle_engine_event(EngineEvent::GaplessTransition, start + ms(5000));
    assert_eq!(manager.state().current_track_index(), Some(0));
    assert_eq!(manager.queue().len(), 1);
}

// ===== Track End =====

#[test]
fn test_ended_advances_after_grace_delay() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(EngineEvent::Ended, start);
    assert_eq!(manager.phase(), PlayerPhase::Loading);
    assert!(manager.drain_commands().is_empty());

    manager.poll_timers(start + ms(50));
    assert!(manager.drain_commands().is_empty());

    manager.poll_timers(start + ms(100));
    let commands = manager.drain_commands();
    assert_eq!(
        play_commands(&commands),
        vec![Path::new("/music/Album/02.flac")]
    );
}

#[test]
fn test_repeat_one_replays_after_end() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    manager.set_repeat(RepeatMode::One);
    start_playing(&mut manager, 1, start);

    manager.handle_engine_event(EngineEvent::Ended, start);
    manager.poll_timers(start + ms(100));
    assert_eq!(manager.state().current_track_index(), Some(1));
    assert_eq!(
        play_commands(&manager.drain_commands()),
        vec![Path::new("/music/Album/02.flac")]
    );
}

#[test]
fn test_repeat_one_end_replays_and_keeps_queue() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    manager.set_repeat(RepeatMode::One);
    start_playing(&mut manager, 0, start);
    manager
        .enqueue(Path::new("/music/Album/03.flac"))
        .unwrap();
    manager.drain_commands();

    manager.handle_engine_event(EngineEvent::Ended, start);
    manager.poll_timers(start + ms(100));

    assert_eq!(manager.state().current_track_index(), Some(0));
    assert_eq!(
        play_commands(&manager.drain_commands()),
        vec![Path::new("/music/Album/01.flac")]
    );
    assert_eq!(manager.queue().len(), 1);

    // A user skip still takes the queue head
    assert_eq!(manager.request_next(), Some(2));
    assert!(manager.queue().is_empty());
}

#[test]
fn test_last_track_end_stops_cleanly() {
    let mut manager = manager(single_album(2));
    let start = Instant::now();
    start_playing(&mut manager, 1, start);

    manager.handle_engine_event(EngineEvent::Ended, start);
    manager.poll_timers(start + ms(100));

    assert_eq!(manager.phase(), PlayerPhase::Stopped);
    assert!(!manager.is_playing());
    assert!(manager.drain_commands().is_empty());
    assert!(manager
        .drain_events()
        .contains(&PlayerEvent::PlaybackFinished));
}

#[test]
fn test_user_skip_during_grace_cancels_auto_advance() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(EngineEvent::Ended, start);
    manager.play_index(2).unwrap();
    manager.poll_timers(start + ms(500));

    assert_eq!(manager.state().current_track_index(), Some(2));
    assert_eq!(play_commands(&manager.drain_commands()).len(), 1);
}

// ===== Errors =====

#[test]
fn test_unplayable_track_skipped_after_delay() {
    let mut manager = manager(single_album(3));
    let start = Instant::now();
    manager.play_index(0).unwrap();
    manager.drain_commands();

    manager.handle_engine_event(
        EngineEvent::Error {
            code: PlaybackErrorCode::FileProbeFailed,
            message: "Unsupported format".to_string(),
            details: String::new(),
        },
        start,
    );
    manager.poll_timers(start + ms(999));
    assert_eq!(manager.state().current_track_index(), Some(0));

    manager.poll_timers(start + ms(1000));
    assert_eq!(manager.state().current_track_index(), Some(1));
}

#[test]
fn test_error_notice_surfaces_again_after_window() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    let error = || EngineEvent::Error {
        code: PlaybackErrorCode::Other("device_lost".to_string()),
        message: "Output device disconnected".to_string(),
        details: String::new(),
    };

    manager.handle_engine_event(error(), start);
    manager.handle_engine_event(error(), start + ms(1999));
    manager.handle_engine_event(error(), start + ms(2000));

    let notices = manager
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, PlayerEvent::ErrorNotice { .. }))
        .count();
    assert_eq!(notices, 2);
}

#[test]
fn test_all_tracks_unplayable_stops() {
    let mut manager = manager(single_album(2));
    manager.set_repeat(RepeatMode::All);
    let start = Instant::now();
    manager.play_index(0).unwrap();

    let missing = || EngineEvent::Error {
        code: PlaybackErrorCode::FileNotFound,
        message: "missing".to_string(),
        details: String::new(),
    };

    manager.handle_engine_event(missing(), start);
    manager.poll_timers(start + ms(1000));
    assert_eq!(manager.state().current_track_index(), Some(1));

    manager.handle_engine_event(missing(), start + ms(1100));
    manager.poll_timers(start + ms(2100));
    assert_eq!(manager.phase(), PlayerPhase::Stopped);
}

// ===== Audio Specs =====

#[test]
fn test_audio_specs_set_quality_indicator() {
    let mut manager = manager(single_album(1));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    manager.handle_engine_event(
        EngineEvent::AudioSpecs(noir_playback::AudioSpecs {
            source_sample_rate: 96_000,
            source_bit_depth: 24,
            source_channels: 2,
            output_sample_rate: 48_000,
            output_channels: 2,
            is_mismatch: true,
        }),
        start,
    );
    assert_eq!(
        manager.state().audio_quality(),
        noir_playback::AudioQuality::Resampled {
            source_rate: 96_000,
            output_rate: 48_000
        }
    );
}

#[test]
fn test_late_poll_advances_only_once() {
    let mut manager = manager(single_album(4));
    let start = Instant::now();
    start_playing(&mut manager, 0, start);

    // Both the end-of-track grace and an error skip are due by the next poll
    manager.handle_engine_event(EngineEvent::Ended, start);
    manager.handle_engine_event(
        EngineEvent::Error {
            code: PlaybackErrorCode::FileNotFound,
            message: "missing".to_string(),
            details: String::new(),
        },
        start + ms(50),
    );
    manager.poll_timers(start + ms(5000));

    assert_eq!(manager.state().current_track_index(), Some(1));
    assert_eq!(
        play_commands(&manager.drain_commands()),
        vec![Path::new("/music/Album/02.flac")]
    );
    assert!(manager.next_deadline().is_none());
}
