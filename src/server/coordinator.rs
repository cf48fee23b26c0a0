//! Update Coordinator
//!
//! Drives one submission through parse, lookup, validation and storage,
//! then tells the activity feed and any subscribers about it.
//!
//! ```text
//! body ─► parse ─► repository check ─► find existing
//!                                       │
//!            ┌──────────────────────────┴──────────────────────┐
//!            ▼ new                                             ▼ existing
//!   creation ─► consistency ─► store          invariants ─► forward-only ─► consistency ─► store
//!                                                               │
//!                                                               └─► Discarded (logged)
//! ```

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::matches::document::{MalformedInputError, MatchDocument};
use crate::matches::fields;
use crate::matches::record::{LookupError, MatchKey, MatchRecord};
use crate::validation::{ConsistencyError, MatchValidator, ValidationError};

use super::config::SpectatorConfig;
use super::feed::{ActivityFeed, FeedEntry};
use super::store::{MatchStore, StoreError};

/// What happened to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A new match was stored.
    Created(MatchKey),
    /// An existing match was replaced.
    Updated(MatchKey),
    /// The update did not move the match forward and was dropped.
    Discarded(MatchKey),
}

impl SubmissionOutcome {
    /// Key of the match the submission belongs to.
    pub fn key(&self) -> &MatchKey {
        match self {
            Self::Created(key) | Self::Updated(key) | Self::Discarded(key) => key,
        }
    }
}

/// Reasons a submission is refused.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Body is not a JSON object.
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),
    /// `gameMetaURL` points outside the allowed repositories.
    #[error("game repository not allowed: {url}")]
    RepositoryNotAllowed {
        /// Offending URL.
        url: String,
    },
    /// Document contradicts itself.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
    /// Creation or update rules violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Lookup of the existing match failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Notification published after every stored submission.
#[derive(Debug, Clone, Serialize)]
pub struct MatchUpdate {
    /// Updated match.
    pub key: MatchKey,
    /// Whether the host has marked the match completed.
    pub completed: bool,
    /// The stored document.
    pub snapshot: MatchDocument,
}

/// Host part of an absolute URL.
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(|c: char| c == '/' || c == '?' || c == '#').next()?;
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = authority.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Accepts match submissions from hosts and serves the latest versions.
pub struct UpdateCoordinator<S: MatchStore> {
    config: SpectatorConfig,
    validator: MatchValidator,
    store: Arc<S>,
    feed: ActivityFeed,
    updates: broadcast::Sender<MatchUpdate>,
}

impl<S: MatchStore> UpdateCoordinator<S> {
    /// Create a coordinator over `store`.
    pub fn new(config: SpectatorConfig, validator: MatchValidator, store: Arc<S>) -> Self {
        let (updates, _) = broadcast::channel(config.notify_capacity.max(1));
        let feed = ActivityFeed::new(config.feed_capacity);
        Self {
            config,
            validator,
            store,
            feed,
            updates,
        }
    }

    /// Submit a match document on behalf of a host.
    ///
    /// `auth_token` is bound to the match when it is created.
    #[instrument(skip(self, body, auth_token))]
    pub fn submit(
        &self,
        body: &str,
        auth_token: &str,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let result = self.process(body, auth_token);
        match &result {
            Ok(SubmissionOutcome::Created(key)) => info!(%key, "match created"),
            Ok(SubmissionOutcome::Updated(key)) => info!(%key, "match updated"),
            Ok(SubmissionOutcome::Discarded(_)) => {}
            Err(e) => debug!(error = %e, "submission rejected"),
        }
        result
    }

    fn process(&self, body: &str, auth_token: &str) -> Result<SubmissionOutcome, SubmissionError> {
        let doc = MatchDocument::parse(body)?;
        self.check_repository(&doc)?;

        let now = self.validator.clock().now();
        let outcome = match MatchRecord::find_existing(self.store.as_ref(), &doc)? {
            Some(mut record) => {
                let key = record.key().clone();
                self.validator.validate_update_invariants(record.document(), &doc)?;
                if let Err(e) = self.validator.validate_update_is_forward_only(record.document(), &doc) {
                    warn!(%key, reason = %e.reason, "discarding update that does not move forward");
                    return Ok(SubmissionOutcome::Discarded(key));
                }
                self.validator.validate_internal_consistency(&doc)?;

                record.replace_document(doc, now);
                self.store.store(&record)?;
                self.publish(&record);
                SubmissionOutcome::Updated(key)
            }
            None => {
                self.validator.validate_creation(&doc)?;
                self.validator.validate_internal_consistency(&doc)?;

                let record = MatchRecord::create_new(doc, auth_token, now)?;
                self.store.store(&record)?;
                self.publish(&record);
                SubmissionOutcome::Created(record.key().clone())
            }
        };
        Ok(outcome)
    }

    fn check_repository(&self, doc: &MatchDocument) -> Result<(), SubmissionError> {
        if self.config.allowed_repositories.is_empty() {
            return Ok(());
        }
        // Missing or mistyped URLs are reported by the consistency checks.
        let url = match doc.optional_str(fields::GAME_META_URL) {
            Ok(Some(url)) => url,
            _ => return Ok(()),
        };
        match url_host(url) {
            Some(host) if self.config.is_repository_allowed(host) => Ok(()),
            _ => Err(SubmissionError::RepositoryNotAllowed { url: url.to_string() }),
        }
    }

    /// Runs after the record is stored, so failures here are only logged.
    fn publish(&self, record: &MatchRecord) {
        if let Err(e) = self.feed.record(record.key(), record.last_updated()) {
            warn!(key = %record.key(), error = %e, "activity feed not updated");
        }

        let completed = matches!(
            record.document().optional_bool(fields::IS_COMPLETED),
            Ok(Some(true))
        );
        let update = MatchUpdate {
            key: record.key().clone(),
            completed,
            snapshot: record.document().clone(),
        };
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }

    /// Latest stored document of a match.
    pub fn latest(&self, key: &MatchKey) -> Result<Option<MatchDocument>, StoreError> {
        Ok(self.store.load(key)?.map(|record| record.document().clone()))
    }

    /// Recently updated matches, newest first.
    pub fn recent_matches(&self) -> Result<Vec<FeedEntry>, StoreError> {
        self.feed.recent()
    }

    /// Receive a [`MatchUpdate`] for every stored submission from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchUpdate> {
        self.updates.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &SpectatorConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::matches::fixtures::{advance, base_match, two_player_match, TEST_NOW_MILLIS};
    use crate::matches::record::compute_identity_key;
    use crate::server::store::InMemoryMatchStore;
    use crate::signing::verifier::{sign_document, RsaSignatureVerifier};
    use serde_json::{json, Value};

    const HOST_PRIVATE: &str = include_str!("../signing/testdata/host_private.pem");
    const HOST_PUBLIC: &str = include_str!("../signing/testdata/host_public.pem");

    fn coordinator_with(config: SpectatorConfig) -> UpdateCoordinator<InMemoryMatchStore> {
        let validator = MatchValidator::new(
            Arc::new(FixedClock::at_millis(TEST_NOW_MILLIS)),
            Arc::new(RsaSignatureVerifier::new()),
        );
        UpdateCoordinator::new(config, validator, Arc::new(InMemoryMatchStore::new()))
    }

    fn coordinator() -> UpdateCoordinator<InMemoryMatchStore> {
        coordinator_with(SpectatorConfig::default().allow_any_repository())
    }

    fn key_of(value: &Value) -> MatchKey {
        compute_identity_key(&MatchDocument::from_value(value.clone()).unwrap()).unwrap()
    }

    #[test]
    fn test_create_then_update() {
        let c = coordinator();
        let first = two_player_match(1);
        let key = key_of(&first);

        assert_eq!(
            c.submit(&first.to_string(), "token").unwrap(),
            SubmissionOutcome::Created(key.clone())
        );

        let second = advance(first, 1);
        assert_eq!(
            c.submit(&second.to_string(), "token").unwrap(),
            SubmissionOutcome::Updated(key.clone())
        );
        assert_eq!(
            c.latest(&key).unwrap(),
            Some(MatchDocument::from_value(second).unwrap())
        );
    }

    #[test]
    fn test_backward_update_is_discarded() {
        let c = coordinator();
        let newer = two_player_match(3);
        let key = key_of(&newer);
        c.submit(&newer.to_string(), "token").unwrap();

        let older = two_player_match(2);
        assert_eq!(
            c.submit(&older.to_string(), "token").unwrap(),
            SubmissionOutcome::Discarded(key.clone())
        );
        assert_eq!(
            c.latest(&key).unwrap(),
            Some(MatchDocument::from_value(newer).unwrap())
        );
    }

    #[test]
    fn test_invariant_change_is_hard_error() {
        let c = coordinator();
        c.submit(&base_match().to_string(), "token").unwrap();

        let mut changed = base_match();
        changed["playClock"] = json!(99);
        assert!(matches!(
            c.submit(&changed.to_string(), "token"),
            Err(SubmissionError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_and_inconsistent_bodies() {
        let c = coordinator();
        assert!(matches!(c.submit("[1, 2]", "t"), Err(SubmissionError::Malformed(_))));
        assert!(matches!(c.submit("{not json", "t"), Err(SubmissionError::Malformed(_))));

        let mut unversioned = base_match();
        unversioned["gameMetaURL"] = json!("http://x/game");
        assert!(matches!(
            c.submit(&unversioned.to_string(), "t"),
            Err(SubmissionError::Consistency(_))
        ));

        let mut short = base_match();
        short["randomToken"] = json!("short");
        assert!(matches!(
            c.submit(&short.to_string(), "t"),
            Err(SubmissionError::Validation(_))
        ));
    }

    #[test]
    fn test_unparseable_state_refused_at_creation() {
        let c = coordinator();
        let mut value = base_match();
        value["states"] = json!(["s0"]);
        assert!(matches!(
            c.submit(&value.to_string(), "t"),
            Err(SubmissionError::Consistency(_))
        ));
        assert_eq!(c.latest(&key_of(&value)).unwrap(), None);
    }

    #[test]
    fn test_unparseable_state_refused_on_update() {
        let c = coordinator();
        let first = two_player_match(1);
        c.submit(&first.to_string(), "t").unwrap();

        let mut next = advance(first.clone(), 1);
        next["states"][2] = json!("terminal");
        assert!(matches!(
            c.submit(&next.to_string(), "t"),
            Err(SubmissionError::Consistency(_))
        ));

        let valid = advance(first, 1);
        assert!(matches!(
            c.submit(&valid.to_string(), "t").unwrap(),
            SubmissionOutcome::Updated(_)
        ));
    }

    #[test]
    fn test_repository_allow_list() {
        let c = coordinator_with(SpectatorConfig::default());
        let value = base_match();
        assert!(matches!(
            c.submit(&value.to_string(), "t"),
            Err(SubmissionError::RepositoryNotAllowed { .. })
        ));
        assert_eq!(c.latest(&key_of(&value)).unwrap(), None);

        let mut listed = base_match();
        listed["gameMetaURL"] = json!("http://games.ggp.org/base/games/ticTacToe/v0/");
        assert!(c.submit(&listed.to_string(), "t").is_ok());
    }

    #[test]
    fn test_signed_match_lifecycle() {
        let c = coordinator();
        let first = sign_document(
            &MatchDocument::from_value(two_player_match(1)).unwrap(),
            HOST_PUBLIC,
            HOST_PRIVATE,
        )
        .unwrap();
        let created = c.submit(&first.to_json_string(), "t").unwrap();

        let next = sign_document(
            &MatchDocument::from_value(advance(first.to_value(), 1)).unwrap(),
            HOST_PUBLIC,
            HOST_PRIVATE,
        )
        .unwrap();
        assert_eq!(
            c.submit(&next.to_json_string(), "t").unwrap(),
            SubmissionOutcome::Updated(created.key().clone())
        );

        let mut forged = advance(next.to_value(), 2);
        forged["goalValues"] = json!([0, 100]);
        forged["isCompleted"] = json!(true);
        assert!(matches!(
            c.submit(&forged.to_string(), "t"),
            Err(SubmissionError::Consistency(_))
        ));
    }

    #[test]
    fn test_feed_tracks_recent_matches() {
        let c = coordinator_with(SpectatorConfig {
            feed_capacity: 2,
            ..SpectatorConfig::default().allow_any_repository()
        });

        let mut keys = Vec::new();
        for id in ["a", "b", "c"] {
            let mut value = base_match();
            value["matchId"] = json!(id);
            keys.push(key_of(&value));
            c.submit(&value.to_string(), "t").unwrap();
        }

        let recent: Vec<MatchKey> = c.recent_matches().unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(recent, vec![keys[2].clone(), keys[1].clone()]);
    }

    #[tokio::test]
    async fn test_feed_failure_does_not_fail_stored_submission() {
        let c = coordinator();
        let mut rx = c.subscribe();
        c.feed.poison();

        let first = two_player_match(1);
        let key = key_of(&first);
        assert_eq!(
            c.submit(&first.to_string(), "t").unwrap(),
            SubmissionOutcome::Created(key.clone())
        );
        assert!(c.latest(&key).unwrap().is_some());
        assert_eq!(rx.recv().await.unwrap().key, key);

        let next = advance(first, 1);
        assert_eq!(
            c.submit(&next.to_string(), "t").unwrap(),
            SubmissionOutcome::Updated(key)
        );
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("http://games.ggp.org/base/v1"), Some("games.ggp.org"));
        assert_eq!(url_host("https://user@host.org:8080/x/v2/"), Some("host.org"));
        assert_eq!(url_host("/relative/v1"), None);
    }

    #[tokio::test]
    async fn test_subscribers_receive_updates() {
        let c = coordinator();
        let mut rx = c.subscribe();

        let mut value = two_player_match(1);
        c.submit(&value.to_string(), "t").unwrap();
        value = advance(value, 1);
        value["isCompleted"] = json!(true);
        value["goalValues"] = json!([100, 0]);
        c.submit(&value.to_string(), "t").unwrap();

        let created = rx.recv().await.unwrap();
        assert!(!created.completed);
        let finished = rx.recv().await.unwrap();
        assert!(finished.completed);
        assert_eq!(finished.key, created.key);
        assert_eq!(finished.snapshot, MatchDocument::from_value(value).unwrap());
    }

    #[tokio::test]
    async fn test_discarded_update_is_not_published() {
        let c = coordinator();
        c.submit(&two_player_match(2).to_string(), "t").unwrap();

        let mut rx = c.subscribe();
        c.submit(&two_player_match(1).to_string(), "t").unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
