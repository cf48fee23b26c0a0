//! Spectator Server
//!
//! Storage, configuration, the activity feed and the coordinator that ties
//! validation to them.

pub mod config;
pub mod coordinator;
pub mod feed;
pub mod store;

pub use config::SpectatorConfig;
pub use coordinator::{MatchUpdate, SubmissionError, SubmissionOutcome, UpdateCoordinator};
pub use feed::{ActivityFeed, FeedEntry};
pub use store::{InMemoryMatchStore, MatchStore, StoreError};
