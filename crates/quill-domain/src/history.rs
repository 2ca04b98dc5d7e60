//! Capped history of completed bibliography syncs
//!
//! The history exists to throttle reloads triggered by citations whose
//! entries are missing from the local store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of sync timestamps kept by default
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Minimum interval between missing-entry reloads, in milliseconds
pub const DEFAULT_RELOAD_WINDOW_MS: i64 = 30_000;

/// Timestamps of the most recent successful syncs, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistory {
    timestamps: VecDeque<DateTime<Utc>>,
    capacity: usize,
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SyncHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            timestamps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sync, evicting the oldest timestamps beyond capacity
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.timestamps.push_back(at);
        while self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.timestamps.back().copied()
    }

    /// The timestamp before the latest one
    pub fn second_latest(&self) -> Option<DateTime<Utc>> {
        let len = self.timestamps.len();
        if len < 2 {
            return None;
        }
        self.timestamps.get(len - 2).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.timestamps.iter()
    }

    /// Whether a missing-entry reload may run at `now`.
    ///
    /// Allowed while fewer than two syncs are recorded, or once the
    /// second-most-recent sync is strictly older than `window`. At most two
    /// syncs therefore land inside any window.
    pub fn reload_allowed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.second_latest() {
            None => true,
            Some(previous) => now - previous > window,
        }
    }
}
