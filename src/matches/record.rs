//! Match Records
//!
//! A stored match: identity key, the authorization token it was created
//! with, the current document and when it was last replaced.
//!
//! ## Identity keys
//!
//! The key is a domain-separated SHA-256 over
//! `(matchId, startTime, randomToken, matchHostPK?)`. It is the persisted
//! lookup key for every stored match; changing the derivation orphans every
//! match created before the change.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::IdentityHasher;
use crate::server::store::{MatchStore, StoreError};
use crate::validation::error::ConsistencyError;

use super::document::MatchDocument;
use super::fields;

/// Persisted lookup key of a match (64 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchKey(String);

impl MatchKey {
    /// Wrap an existing key string (e.g. from a request path).
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four fields a match's identity is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchIdentity<'a> {
    /// Host-chosen match id.
    pub match_id: &'a str,
    /// Start time (epoch ms).
    pub start_time: i64,
    /// Host-chosen random token.
    pub random_token: &'a str,
    /// Host public key, for signed matches.
    pub match_host_pk: Option<&'a str>,
}

impl<'a> MatchIdentity<'a> {
    /// Extract the identity fields from a document.
    pub fn of(doc: &'a MatchDocument) -> Result<Self, ConsistencyError> {
        Ok(Self {
            match_id: doc.required_str(fields::MATCH_ID)?,
            start_time: doc.required_i64(fields::START_TIME)?,
            random_token: doc.required_str(fields::RANDOM_TOKEN)?,
            match_host_pk: doc.optional_str(fields::MATCH_HOST_PK)?,
        })
    }

    /// Derive the lookup key.
    pub fn key(&self) -> MatchKey {
        let mut hasher = IdentityHasher::for_match_key();
        hasher.update_str(self.match_id);
        hasher.update_i64(self.start_time);
        hasher.update_str(self.random_token);
        hasher.update_opt_str(self.match_host_pk);
        MatchKey(hasher.finalize_hex())
    }

    /// First identity field on which `self` and `other` disagree.
    pub fn first_difference(&self, other: &MatchIdentity<'_>) -> Option<&'static str> {
        if self.match_id != other.match_id {
            Some(fields::MATCH_ID)
        } else if self.start_time != other.start_time {
            Some(fields::START_TIME)
        } else if self.random_token != other.random_token {
            Some(fields::RANDOM_TOKEN)
        } else if self.match_host_pk != other.match_host_pk {
            Some(fields::MATCH_HOST_PK)
        } else {
            None
        }
    }
}

/// Derive the persisted lookup key of a document.
pub fn compute_identity_key(doc: &MatchDocument) -> Result<MatchKey, ConsistencyError> {
    Ok(MatchIdentity::of(doc)?.key())
}

/// Errors looking up the record a submission belongs to.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The submission lacks usable identity fields.
    #[error("cannot derive match key: {0}")]
    Identity(#[from] ConsistencyError),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stored match occupies the key but has a different identity.
    #[error("identity collision on key {key}: stored match differs in {field}")]
    Collision {
        /// Colliding key.
        key: MatchKey,
        /// First differing identity field.
        field: &'static str,
    },
}

/// One stored match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    key: MatchKey,
    auth_token: String,
    document: MatchDocument,
    last_updated: DateTime<Utc>,
}

impl MatchRecord {
    /// Allocate a record for a brand-new match, permanently bound to
    /// `auth_token`. Callers run creation and consistency checks first.
    pub fn create_new(
        document: MatchDocument,
        auth_token: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ConsistencyError> {
        let key = compute_identity_key(&document)?;
        Ok(Self {
            key,
            auth_token: auth_token.into(),
            document,
            last_updated: now,
        })
    }

    /// Load the record whose identity matches `doc`, if one exists.
    ///
    /// The loaded document's identity fields are compared against `doc`
    /// so a key collision is never mistaken for the same match.
    pub fn find_existing<S: MatchStore + ?Sized>(
        store: &S,
        doc: &MatchDocument,
    ) -> Result<Option<Self>, LookupError> {
        let identity = MatchIdentity::of(doc)?;
        let key = identity.key();

        let record = match store.load(&key)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let stored = MatchIdentity::of(&record.document)?;
        if let Some(field) = stored.first_difference(&identity) {
            return Err(LookupError::Collision { key, field });
        }

        Ok(Some(record))
    }

    /// Replace the document wholesale with an accepted update.
    pub fn replace_document(&mut self, document: MatchDocument, now: DateTime<Utc>) {
        self.document = document;
        self.last_updated = now;
    }

    /// Lookup key.
    pub fn key(&self) -> &MatchKey {
        &self.key
    }

    /// Token supplied when the match was created.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Current document.
    pub fn document(&self) -> &MatchDocument {
        &self.document
    }

    /// When the document was last replaced.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
