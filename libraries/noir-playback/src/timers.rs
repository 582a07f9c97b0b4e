//! Cancellable one-shot timers
//!
//! Each timer kind has a single slot. Arming a slot replaces whatever was
//! pending in it (supersede-and-cancel), so a stale deadline can never fire
//! after a newer one was requested. The slots hold deadlines only; the
//! runtime sleeps until `next_deadline()` and then drains `pop_expired()`.

use std::time::Duration;
use tokio::time::Instant;

/// Timer kinds owned by the playback manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Seek confirmation deadline
    SeekSafety,
    /// Toggle play/pause debounce window
    ToggleDebounce,
    /// Grace delay between `ended` and loading the next track
    AdvanceGrace,
    /// Delay before skipping a track the engine could not play
    ErrorAdvance,
}

impl TimerKind {
    const ALL: [TimerKind; 4] = [
        TimerKind::SeekSafety,
        TimerKind::ToggleDebounce,
        TimerKind::AdvanceGrace,
        TimerKind::ErrorAdvance,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::SeekSafety => 0,
            TimerKind::ToggleDebounce => 1,
            TimerKind::AdvanceGrace => 2,
            TimerKind::ErrorAdvance => 3,
        }
    }
}

/// Token identifying one arming of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct TimerSlot {
    deadline: Option<Instant>,
    generation: u64,
}

/// Fixed set of timer slots
#[derive(Debug, Clone, Default)]
pub struct Timers {
    slots: [TimerSlot; 4],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire `delay` after `now`, cancelling any pending deadline
    pub fn arm(&mut self, kind: TimerKind, now: Instant, delay: Duration) -> TimerToken {
        let slot = &mut self.slots[kind.slot()];
        slot.generation += 1;
        slot.deadline = Some(now + delay);
        TimerToken {
            kind,
            generation: slot.generation,
        }
    }

    /// Cancel the pending deadline of `kind`, if any
    pub fn cancel(&mut self, kind: TimerKind) {
        self.slots[kind.slot()].deadline = None;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].deadline.is_some()
    }

    /// Whether `token` is still the live arming of its slot
    pub fn is_current(&self, token: TimerToken) -> bool {
        let slot = &self.slots[token.kind.slot()];
        slot.deadline.is_some() && slot.generation == token.generation
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.slots[kind.slot()].deadline
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().filter_map(|slot| slot.deadline).min()
    }

    /// Disarm and return the earliest slot whose deadline has passed
    ///
    /// Handlers run between calls, so a slot cancelled by an earlier
    /// handler at the same instant is never returned.
    pub fn pop_expired(&mut self, now: Instant) -> Option<TimerKind> {
        let kind = TimerKind::ALL
            .iter()
            .copied()
            .filter_map(|kind| {
                self.slots[kind.slot()]
                    .deadline
                    .filter(|&deadline| deadline <= now)
                    .map(|deadline| (deadline, kind))
            })
            .min_by_key(|(deadline, _)| *deadline)
            .map(|(_, kind)| kind)?;
        self.slots[kind.slot()].deadline = None;
        Some(kind)
    }
}
