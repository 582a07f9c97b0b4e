//! Next/previous track selection
//!
//! Priority for "next":
//! 1. The head of the user queue
//! 2. The current track again, with repeat-one
//! 3. A random unserved track, with shuffle (album set or whole library)
//! 4. The following track of the album set, then of the catalog
//!
//! Selection is split into a dry run (`peek_next`), used to tell the engine
//! what to preload, and `commit`, which consumes the queue head and updates
//! the shuffle history once the track actually starts.

use crate::queue::PlaybackQueue;
use crate::state::PlaybackState;
use crate::types::{RepeatMode, ShuffleMode};
use noir_core::TrackCatalog;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Where a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Queue,
    RepeatOne,
    Shuffle {
        /// The shuffle pool was exhausted and a new cycle starts with this pick
        new_cycle: bool,
    },
    Sequential,
}

/// A selected catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub source: SelectionSource,
}

impl Selection {
    fn new(index: usize, source: SelectionSource) -> Self {
        Self { index, source }
    }
}

/// Tracks belonging to the same album as `index`, in play order
///
/// A track belongs to the set when it shares the folder of the reference
/// track, or when both carry the same `(album, artist)` tags. Ordered by
/// disc, track number, then display name. Empty when `index` is out of range.
pub fn album_set<C: TrackCatalog + ?Sized>(catalog: &C, index: usize) -> Vec<usize> {
    let Some(reference) = catalog.get(index) else {
        return Vec::new();
    };
    let folder = reference.folder();
    let key = reference.album_key();

    let mut members: Vec<usize> = catalog
        .tracks()
        .iter()
        .enumerate()
        .filter(|(_, track)| {
            (folder.is_some() && track.folder() == folder)
                || (key.is_some() && track.album_key() == key)
        })
        .map(|(i, _)| i)
        .collect();

    let tracks = catalog.tracks();
    members.sort_by_cached_key(|&i| {
        let track = &tracks[i];
        (track.disc(), track.number(), track.display_name(), i)
    });
    members
}

/// Dry run of "next": what would play if the current track ended now
///
/// Mutates nothing except the random generator.
pub fn peek_next<C, Q, R>(
    state: &PlaybackState,
    queue: &Q,
    catalog: &C,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<Selection>
where
    C: TrackCatalog + ?Sized,
    Q: PlaybackQueue + ?Sized,
    R: Rng + ?Sized,
{
    if let Some(head) = queue.peek() {
        match catalog.index_of(head) {
            Some(index) => return Some(Selection::new(index, SelectionSource::Queue)),
            None => debug!(path = %head.display(), "Queued track is not in the catalog"),
        }
    }

    let Some(current) = state.current_track_index else {
        return first_selection(state, catalog, rng);
    };

    if repeat == RepeatMode::One && catalog.get(current).is_some() {
        return Some(Selection::new(current, SelectionSource::RepeatOne));
    }

    if let Some(selection) = shuffle_pick(state, catalog, current, rng) {
        return Some(selection);
    }

    sequential_next(catalog, current, repeat)
        .map(|index| Selection::new(index, SelectionSource::Sequential))
}

/// Dry run of what follows a track that plays to its end
///
/// Same as `peek_next`, except that repeat-one keeps the current track even
/// while the queue has entries. The queue only wins over repeat-one when the
/// user skips.
pub fn peek_after_end<C, Q, R>(
    state: &PlaybackState,
    queue: &Q,
    catalog: &C,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<Selection>
where
    C: TrackCatalog + ?Sized,
    Q: PlaybackQueue + ?Sized,
    R: Rng + ?Sized,
{
    repeat_one(state, catalog, repeat).or_else(|| peek_next(state, queue, catalog, repeat, rng))
}

/// The current track, when repeat-one applies to it
pub fn repeat_one<C: TrackCatalog + ?Sized>(
    state: &PlaybackState,
    catalog: &C,
    repeat: RepeatMode,
) -> Option<Selection> {
    if repeat != RepeatMode::One {
        return None;
    }
    state
        .current_track_index
        .filter(|&index| catalog.get(index).is_some())
        .map(|index| Selection::new(index, SelectionSource::RepeatOne))
}

/// Select the next track and commit it
pub fn next<C, Q, R>(
    state: &mut PlaybackState,
    queue: &mut Q,
    catalog: &C,
    repeat: RepeatMode,
    rng: &mut R,
) -> Option<Selection>
where
    C: TrackCatalog + ?Sized,
    Q: PlaybackQueue + ?Sized,
    R: Rng + ?Sized,
{
    // Drop queue entries that no longer resolve so they cannot block the queue
    while let Some(head) = queue.peek() {
        if catalog.index_of(head).is_some() {
            break;
        }
        warn!(path = %head.display(), "Dropping queued track missing from catalog");
        queue.pop();
    }

    let selection = peek_next(state, queue, catalog, repeat, rng)?;
    commit(state, queue, catalog, selection);
    Some(selection)
}

/// Apply the side effects of a selection that is now playing
///
/// Consumes the queue head if the selection came from it and records the
/// track in the shuffle history.
pub fn commit<C, Q>(state: &mut PlaybackState, queue: &mut Q, catalog: &C, selection: Selection)
where
    C: TrackCatalog + ?Sized,
    Q: PlaybackQueue + ?Sized,
{
    let Some(track) = catalog.get(selection.index) else {
        return;
    };

    match selection.source {
        SelectionSource::Queue => {
            if queue.peek() == Some(track.path.as_path()) {
                queue.pop();
            }
        }
        SelectionSource::Shuffle { new_cycle: true } => {
            debug!("Shuffle pool exhausted, starting new cycle");
            let current = state
                .current_track_index
                .and_then(|index| catalog.get(index))
                .map(|track| track.path.as_path());
            state.shuffle_history.restart_cycle(current);
        }
        SelectionSource::Shuffle { new_cycle: false }
        | SelectionSource::RepeatOne
        | SelectionSource::Sequential => {}
    }

    record_served(state, catalog, selection.index);
}

/// Record `index` as served by shuffle
///
/// The history is first narrowed to the shuffle pool of `index`, so it never
/// holds more entries than that pool (album changes through the queue or an
/// explicit pick leave no foreign paths behind). No-op with shuffle off.
pub fn record_served<C: TrackCatalog + ?Sized>(
    state: &mut PlaybackState,
    catalog: &C,
    index: usize,
) {
    if state.shuffle_mode == ShuffleMode::Off {
        return;
    }
    let Some(track) = catalog.get(index) else {
        return;
    };

    let pool = shuffle_pool(state.shuffle_mode, catalog, index);
    let pool_paths: HashSet<&Path> = pool.iter().map(|(_, path)| *path).collect();
    state.shuffle_history.retain_pool(&pool_paths);
    state.shuffle_history.record(&track.path);
}

/// Track before the current one, ignoring shuffle and the queue
///
/// Album predecessor first; at the start of the album, the album's last
/// track with repeat-all, otherwise the catalog entry before the album.
pub fn previous<C: TrackCatalog + ?Sized>(
    state: &PlaybackState,
    catalog: &C,
    repeat: RepeatMode,
) -> Option<usize> {
    let current = state.current_track_index?;
    let set = album_set(catalog, current);

    match set.iter().position(|&i| i == current) {
        Some(position) if position > 0 => Some(set[position - 1]),
        Some(_) if repeat == RepeatMode::All => set.last().copied(),
        Some(_) => set.iter().min().and_then(|&first| first.checked_sub(1)),
        None => catalog_previous(catalog, current, repeat),
    }
}

fn first_selection<C, R>(state: &PlaybackState, catalog: &C, rng: &mut R) -> Option<Selection>
where
    C: TrackCatalog + ?Sized,
    R: Rng + ?Sized,
{
    if catalog.is_empty() {
        return None;
    }

    if state.shuffle_mode == ShuffleMode::Library {
        let index = rng.gen_range(0..catalog.len());
        return Some(Selection::new(
            index,
            SelectionSource::Shuffle { new_cycle: false },
        ));
    }

    Some(Selection::new(0, SelectionSource::Sequential))
}

fn shuffle_pool<C: TrackCatalog + ?Sized>(
    mode: ShuffleMode,
    catalog: &C,
    current: usize,
) -> Vec<(usize, &Path)> {
    let tracks = catalog.tracks();
    match mode {
        ShuffleMode::Off => Vec::new(),
        ShuffleMode::Album => album_set(catalog, current)
            .into_iter()
            .map(|i| (i, tracks[i].path.as_path()))
            .collect(),
        ShuffleMode::Library => tracks
            .iter()
            .enumerate()
            .map(|(i, track)| (i, track.path.as_path()))
            .collect(),
    }
}

fn shuffle_pick<C, R>(
    state: &PlaybackState,
    catalog: &C,
    current: usize,
    rng: &mut R,
) -> Option<Selection>
where
    C: TrackCatalog + ?Sized,
    R: Rng + ?Sized,
{
    if state.shuffle_mode == ShuffleMode::Off {
        return None;
    }

    let pool = shuffle_pool(state.shuffle_mode, catalog, current);
    let current_path = catalog.get(current).map(|track| track.path.as_path());
    let pick = state.shuffle_history.pick(&pool, current_path, rng)?;

    Some(Selection::new(
        pick.index,
        SelectionSource::Shuffle {
            new_cycle: pick.new_cycle,
        },
    ))
}

fn sequential_next<C: TrackCatalog + ?Sized>(
    catalog: &C,
    current: usize,
    repeat: RepeatMode,
) -> Option<usize> {
    let set = album_set(catalog, current);

    let Some(position) = set.iter().position(|&i| i == current) else {
        debug!(current, "Current track not found in its album, using catalog order");
        return catalog_next(catalog, current, repeat);
    };

    if let Some(&following) = set.get(position + 1) {
        return Some(following);
    }
    if repeat == RepeatMode::All {
        return set.first().copied();
    }

    // Album finished: continue with the catalog entry after the album
    let after = set.iter().max().map_or(current, |&last| last) + 1;
    (after < catalog.len()).then_some(after)
}

fn catalog_next<C: TrackCatalog + ?Sized>(
    catalog: &C,
    current: usize,
    repeat: RepeatMode,
) -> Option<usize> {
    let len = catalog.len();
    if current + 1 < len {
        Some(current + 1)
    } else if repeat == RepeatMode::All && len > 0 {
        Some(0)
    } else {
        None
    }
}

fn catalog_previous<C: TrackCatalog + ?Sized>(
    catalog: &C,
    current: usize,
    repeat: RepeatMode,
) -> Option<usize> {
    let len = catalog.len();
    if len == 0 {
        return None;
    }
    if current > 0 {
        Some((current - 1).min(len - 1))
    } else if repeat == RepeatMode::All {
        Some(len - 1)
    } else {
        None
    }
}
