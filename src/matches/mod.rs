//! Match Data Model
//!
//! Match documents as submitted by hosts, their typed view, and the stored
//! record each match lives in.

pub mod descriptor;
pub mod document;
pub mod fields;
pub mod record;

#[cfg(test)]
pub(crate) mod fixtures;

pub use descriptor::MatchDescriptor;
pub use document::{Field, MalformedInputError, MatchDocument, SchemaError};
pub use record::{
    compute_identity_key, LookupError, MatchIdentity, MatchKey, MatchRecord,
};
