//! Host Signatures
//!
//! Canonical payloads and RS256 verification of signed match documents.

pub mod canonical;
pub mod verifier;

pub use canonical::{canonical_json, signing_payload};
pub use verifier::{
    compact_public_key, public_key_pem, sign_document, RsaSignatureVerifier, SignatureError,
    SignatureVerifier, StubSignatureVerifier,
};
