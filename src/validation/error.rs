//! Validation errors.

use thiserror::Error;

use crate::matches::document::SchemaError;

/// The document contradicts itself: wrong array lengths, unversioned URL,
/// bad signature, nulls, unknown fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("inconsistent match: {reason}")]
pub struct ConsistencyError {
    /// Human-readable diagnostic naming the field and observed values.
    pub reason: String,
}

impl ConsistencyError {
    /// Create an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl From<SchemaError> for ConsistencyError {
    fn from(err: SchemaError) -> Self {
        Self::new(err.to_string())
    }
}

/// The document violates creation, identity-invariant or forward-progress
/// rules relative to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid match update: {reason}")]
pub struct ValidationError {
    /// Human-readable diagnostic naming the field and observed values.
    pub reason: String,
}

impl ValidationError {
    /// Create an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl From<SchemaError> for ValidationError {
    fn from(err: SchemaError) -> Self {
        Self::new(err.to_string())
    }
}
