//! Activity Feed
//!
//! The most recently updated matches, newest first. A match updated again
//! moves back to the front rather than appearing twice.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matches::record::MatchKey;

use super::store::StoreError;

/// One feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Updated match.
    pub key: MatchKey,
    /// When the update was accepted.
    pub updated_at: DateTime<Utc>,
    /// Position in the overall update sequence; strictly increasing.
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct FeedState {
    entries: VecDeque<FeedEntry>,
    next_sequence: u64,
}

/// Bounded list of recently updated matches.
#[derive(Debug)]
pub struct ActivityFeed {
    capacity: usize,
    state: RwLock<FeedState>,
}

impl ActivityFeed {
    /// Create a feed keeping at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: RwLock::new(FeedState::default()),
        }
    }

    /// Maximum number of entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record that `key` was updated at `at`.
    pub fn record(&self, key: &MatchKey, at: DateTime<Utc>) -> Result<FeedEntry, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;

        state.entries.retain(|entry| &entry.key != key);

        let entry = FeedEntry {
            key: key.clone(),
            updated_at: at,
            sequence: state.next_sequence,
        };
        state.next_sequence += 1;
        state.entries.push_front(entry.clone());
        state.entries.truncate(self.capacity);

        Ok(entry)
    }

    /// Poison the feed lock, as a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.state.write();
            panic!("writer panicked");
        }));
    }

    /// Entries, newest first.
    pub fn recent(&self) -> Result<Vec<FeedEntry>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.entries.iter().cloned().collect())
    }
}
