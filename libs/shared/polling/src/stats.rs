use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a pollable resource's driver.
///
/// `armed` is a gauge (0 or 1); everything else only ever grows.
#[derive(Debug, Default)]
pub struct PollerStats {
    timers_scheduled: AtomicU64,
    timers_cancelled: AtomicU64,
    armed: AtomicU64,
    fetches_started: AtomicU64,
    fetches_completed: AtomicU64,
    fetches_failed: AtomicU64,
    fetches_dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStatsSnapshot {
    pub timers_scheduled: u64,
    pub timers_cancelled: u64,
    pub armed_timers: u64,
    pub fetches_started: u64,
    pub fetches_completed: u64,
    pub fetches_failed: u64,
    pub fetches_dropped: u64,
}

impl PollerStats {
    pub fn snapshot(&self) -> PollerStatsSnapshot {
        PollerStatsSnapshot {
            timers_scheduled: self.timers_scheduled.load(Ordering::SeqCst),
            timers_cancelled: self.timers_cancelled.load(Ordering::SeqCst),
            armed_timers: self.armed.load(Ordering::SeqCst),
            fetches_started: self.fetches_started.load(Ordering::SeqCst),
            fetches_completed: self.fetches_completed.load(Ordering::SeqCst),
            fetches_failed: self.fetches_failed.load(Ordering::SeqCst),
            fetches_dropped: self.fetches_dropped.load(Ordering::SeqCst),
        }
    }

    pub fn armed_timers(&self) -> u64 {
        self.armed.load(Ordering::SeqCst)
    }

    pub(crate) fn timer_armed(&self) {
        self.timers_scheduled.fetch_add(1, Ordering::SeqCst);
        self.armed.store(1, Ordering::SeqCst);
    }

    pub(crate) fn timer_cancelled(&self) {
        self.timers_cancelled.fetch_add(1, Ordering::SeqCst);
        self.armed.store(0, Ordering::SeqCst);
    }

    pub(crate) fn fetch_started(&self) {
        self.fetches_started.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn fetch_completed(&self) {
        self.fetches_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn fetch_failed(&self) {
        self.fetches_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn fetch_dropped(&self) {
        self.fetches_dropped.fetch_add(1, Ordering::SeqCst);
    }
}
