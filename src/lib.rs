//! # GGP Spectator Server
//!
//! Accepts match documents from game hosts, checks that each one is a
//! legitimate continuation of the match it claims to be, and keeps the
//! latest version of every match for spectators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   GGP SPECTATOR SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Leaf primitives                         │
//! │  ├── hash.rs       - Domain-separated identity hashing       │
//! │  ├── clock.rs      - Wall-clock source                       │
//! │  └── symbol.rs     - Bracketed-list state parser             │
//! │                                                              │
//! │  matches/          - Match data model                        │
//! │  ├── document.rs   - Raw JSON document, schema lookups       │
//! │  ├── descriptor.rs - Typed view of a document                │
//! │  ├── fields.rs     - Field names and allow-list              │
//! │  └── record.rs     - Stored record and identity key          │
//! │                                                              │
//! │  validation/       - Pure validation rules                   │
//! │  ├── consistency.rs- Single-document checks                  │
//! │  ├── update.rs     - Invariant and forward-only checks       │
//! │  └── time.rs       - Reasonable-time window                  │
//! │                                                              │
//! │  signing/          - Host signatures (RS256)                 │
//! │                                                              │
//! │  server/           - Storage, feed, notifications            │
//! │  └── coordinator.rs- Submission pipeline                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Keys
//!
//! A match is identified by `(matchId, startTime, randomToken, matchHostPK?)`.
//! The derived key is persisted, so its derivation never changes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod matches;
pub mod server;
pub mod signing;
pub mod validation;

// Re-export commonly used types
pub use matches::{compute_identity_key, MatchDocument, MatchKey, MatchRecord};
pub use server::{
    InMemoryMatchStore, MatchStore, SpectatorConfig, SubmissionError, SubmissionOutcome,
    UpdateCoordinator,
};
pub use signing::{RsaSignatureVerifier, SignatureVerifier};
pub use validation::{ConsistencyError, MatchValidator, ValidationError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
