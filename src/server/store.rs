//! Match Storage
//!
//! The persistence seam. The coordinator loads and stores whole records by
//! identity key; last writer wins per key.

use std::collections::BTreeMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::matches::record::{MatchKey, MatchRecord};

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A writer panicked while holding the store lock.
    #[error("match store lock poisoned")]
    Poisoned,
    /// Backend-specific failure.
    #[error("match store backend error: {0}")]
    Backend(String),
}

/// Load/store access to match records.
pub trait MatchStore: Send + Sync {
    /// Load the record stored under `key`.
    fn load(&self, key: &MatchKey) -> Result<Option<MatchRecord>, StoreError>;

    /// Store `record` under its key, replacing any previous record.
    fn store(&self, record: &MatchRecord) -> Result<(), StoreError>;
}

/// Process-local store backed by a sorted map.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    records: RwLock<BTreeMap<MatchKey, MatchRecord>>,
}

impl InMemoryMatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl MatchStore for InMemoryMatchStore {
    fn load(&self, key: &MatchKey) -> Result<Option<MatchRecord>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn store(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.insert(record.key().clone(), record.clone());
        Ok(())
    }
}
