//! Match Validation
//!
//! The rules a submitted match document must satisfy before it is stored.
//!
//! ## Check order
//!
//! ```text
//! new match:       validate_creation ─► validate_internal_consistency
//! existing match:  validate_update_invariants ─► validate_update_is_forward_only
//!                  ─► validate_internal_consistency
//! ```
//!
//! Every check is pure: it reads the clock and the signature verifier but
//! mutates nothing.

pub mod consistency;
pub mod error;
pub mod time;
pub mod update;

use std::sync::Arc;

use crate::core::clock::{Clock, SystemClock};
use crate::matches::document::MatchDocument;
use crate::matches::fields;
use crate::signing::verifier::{RsaSignatureVerifier, SignatureVerifier};

pub use consistency::is_versioned_url;
pub use error::{ConsistencyError, ValidationError};
pub use time::{check_reasonable_time, TimeError, MAX_FUTURE_SKEW_MILLIS, SYSTEM_EPOCH_MILLIS};

/// Shortest random token a new match may use.
pub const MIN_RANDOM_TOKEN_LEN: usize = 12;

/// Validates match documents against the clock and a signature verifier.
#[derive(Clone)]
pub struct MatchValidator {
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl Default for MatchValidator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RsaSignatureVerifier::new()))
    }
}

impl MatchValidator {
    /// Create a validator.
    pub fn new(clock: Arc<dyn Clock>, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { clock, verifier }
    }

    /// The clock "now" is read from.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Check that `doc` agrees with itself.
    pub fn validate_internal_consistency(
        &self,
        doc: &MatchDocument,
    ) -> Result<(), ConsistencyError> {
        consistency::check_internal_consistency(doc, self.clock.now_millis(), self.verifier.as_ref())
    }

    /// Extra rules for the first version of a match.
    pub fn validate_creation(&self, doc: &MatchDocument) -> Result<(), ValidationError> {
        let start_time = doc.required_i64(fields::START_TIME)?;
        check_reasonable_time(start_time, self.clock.now_millis())
            .map_err(|e| ValidationError::new(format!("startTime: {}", e)))?;

        let token = doc.required_str(fields::RANDOM_TOKEN)?;
        let token_len = token.chars().count();
        if token_len < MIN_RANDOM_TOKEN_LEN {
            return Err(ValidationError::new(format!(
                "randomToken is {} characters; at least {} required",
                token_len, MIN_RANDOM_TOKEN_LEN
            )));
        }

        if doc.contains(fields::MATCH_HOST_PK) && !doc.contains(fields::MATCH_HOST_SIGNATURE) {
            return Err(ValidationError::new(
                "matchHostPK present without matchHostSignature",
            ));
        }
        Ok(())
    }

    /// Identity and ground-rule fields are unchanged from `old`.
    pub fn validate_update_invariants(
        &self,
        old: &MatchDocument,
        new: &MatchDocument,
    ) -> Result<(), ValidationError> {
        update::check_invariants(old, new)
    }

    /// `new` only extends the history recorded in `old`.
    pub fn validate_update_is_forward_only(
        &self,
        old: &MatchDocument,
        new: &MatchDocument,
    ) -> Result<(), ValidationError> {
        update::check_forward_only(old, new)
    }
}

// =============================================================================
// TESTS
// =============================================================================
