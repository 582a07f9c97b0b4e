//! Shuffle history and random selection
//!
//! A shuffle cycle serves every candidate once before any repeats. The
//! history records the paths already served in the current cycle; once the
//! candidate pool is exhausted the history starts over, seeded with the
//! track that just finished so it cannot come straight back.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Outcome of a shuffle pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShufflePick {
    /// Chosen candidate (catalog index)
    pub index: usize,
    /// Whether the pool was exhausted and a new cycle had to start
    pub new_cycle: bool,
}

/// Paths served in the current shuffle cycle
#[derive(Debug, Clone, Default)]
pub struct ShuffleHistory {
    served: HashSet<PathBuf>,
}

impl ShuffleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a served track
    pub fn record(&mut self, path: &Path) {
        self.served.insert(path.to_path_buf());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.served.contains(path)
    }

    pub fn len(&self) -> usize {
        self.served.len()
    }

    pub fn is_empty(&self) -> bool {
        self.served.is_empty()
    }

    /// Forget every served track
    pub fn clear(&mut self) {
        self.served.clear();
    }

    /// Drop entries that are no longer candidates
    ///
    /// Keeps the history a subset of the pool it is consulted against.
    pub fn retain_pool(&mut self, pool_paths: &HashSet<&Path>) {
        self.served.retain(|path| pool_paths.contains(path.as_path()));
    }

    /// Start a new cycle containing only `just_finished`
    pub fn restart_cycle(&mut self, just_finished: Option<&Path>) {
        self.served.clear();
        if let Some(path) = just_finished {
            self.record(path);
        }
    }

    /// Pick uniformly among unserved candidates, without mutating the history
    ///
    /// `pool` pairs catalog indices with their paths. The current track is
    /// never picked while another candidate exists. When every candidate has
    /// been served, the pick is made as if a new cycle had started
    /// (`new_cycle` is set and the caller commits it with `restart_cycle`).
    pub fn pick<R: Rng + ?Sized>(
        &self,
        pool: &[(usize, &Path)],
        current: Option<&Path>,
        rng: &mut R,
    ) -> Option<ShufflePick> {
        let fresh: Vec<usize> = pool
            .iter()
            .filter(|(_, path)| !self.contains(path) && Some(*path) != current)
            .map(|(index, _)| *index)
            .collect();

        if let Some(&index) = fresh.choose(rng) {
            return Some(ShufflePick {
                index,
                new_cycle: false,
            });
        }

        // Exhausted: retry once against a history holding only the current track
        let retry: Vec<usize> = pool
            .iter()
            .filter(|(_, path)| Some(*path) != current)
            .map(|(index, _)| *index)
            .collect();

        retry.choose(rng).map(|&index| ShufflePick {
            index,
            new_cycle: true,
        })
    }
}
