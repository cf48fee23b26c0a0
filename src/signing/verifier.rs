//! Host Signature Verification
//!
//! Signed matches carry `matchHostPK` and `matchHostSignature`. The
//! signature is RSA PKCS#1 v1.5 over SHA-256 (RS256) of the document's
//! canonical JSON with the signature field removed.
//!
//! Public keys are accepted as PEM (`-----BEGIN PUBLIC KEY-----`) or in the
//! compact host format: `"0"` followed by the base64 SubjectPublicKeyInfo.
//! Signatures are base64 in either alphabet, padding optional, optionally
//! prefixed with `"SIG v1 "`.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};
use serde_json::Value;
use thiserror::Error;

use crate::matches::document::MatchDocument;
use crate::matches::fields;

use super::canonical::signing_payload;

/// Prefix hosts may put in front of a signature.
pub const SIGNATURE_PREFIX: &str = "SIG v1 ";

/// Version tag of the compact public key format.
pub const COMPACT_KEY_VERSION: char = '0';

/// Errors verifying a host signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Document has no `matchHostPK`.
    #[error("missing matchHostPK")]
    MissingKey,
    /// Document has no `matchHostSignature`.
    #[error("missing matchHostSignature")]
    MissingSignature,
    /// Public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    /// Signature is not valid base64.
    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(String),
    /// The crypto backend rejected its input.
    #[error("signature check failed: {0}")]
    Crypto(String),
}

/// Checks a document's host signature.
///
/// `Ok(false)` means the signature is well-formed but does not match.
pub trait SignatureVerifier: Send + Sync {
    /// Verify the signature of `doc` against its own `matchHostPK`.
    fn verify(&self, doc: &MatchDocument) -> Result<bool, SignatureError>;
}

fn signature_fields(doc: &MatchDocument) -> Result<(&str, &str), SignatureError> {
    let key = match doc.get(fields::MATCH_HOST_PK) {
        Some(Value::String(key)) => key.as_str(),
        _ => return Err(SignatureError::MissingKey),
    };
    let signature = match doc.get(fields::MATCH_HOST_SIGNATURE) {
        Some(Value::String(sig)) => sig.as_str(),
        _ => return Err(SignatureError::MissingSignature),
    };
    Ok((key, signature))
}

/// RS256 verification of host signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaSignatureVerifier;

impl RsaSignatureVerifier {
    /// Create a verifier.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for RsaSignatureVerifier {
    fn verify(&self, doc: &MatchDocument) -> Result<bool, SignatureError> {
        let (public_key, signature) = signature_fields(doc)?;
        let key = decoding_key(public_key)?;
        let signature = normalize_signature(signature)?;
        let payload = signing_payload(doc);

        crypto::verify(&signature, payload.as_bytes(), &key, Algorithm::RS256)
            .map_err(|e| SignatureError::Crypto(e.to_string()))
    }
}

/// Accepts any document that carries both signature fields.
///
/// For tests and for deployments that trust their hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSignatureVerifier;

impl SignatureVerifier for StubSignatureVerifier {
    fn verify(&self, doc: &MatchDocument) -> Result<bool, SignatureError> {
        let (_, signature) = signature_fields(doc)?;
        Ok(!signature.is_empty())
    }
}

/// Convert a host public key into PEM text.
pub fn public_key_pem(public_key: &str) -> Result<String, SignatureError> {
    let trimmed = public_key.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.to_string());
    }

    let body = trimmed.strip_prefix(COMPACT_KEY_VERSION).ok_or_else(|| {
        SignatureError::InvalidKey("unrecognized public key format".to_string())
    })?;
    let der = STANDARD
        .decode(body)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;

    let encoded = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for line in encoded.as_bytes().chunks(64) {
        // base64 output is ASCII
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    Ok(pem)
}

/// Convert a PEM public key into the compact host format.
pub fn compact_public_key(pem: &str) -> String {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .map(str::trim)
        .collect();
    format!("{}{}", COMPACT_KEY_VERSION, body)
}

fn decoding_key(public_key: &str) -> Result<DecodingKey, SignatureError> {
    let pem = public_key_pem(public_key)?;
    DecodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// Strip the optional prefix and rewrite the signature as unpadded
/// URL-safe base64.
fn normalize_signature(signature: &str) -> Result<String, SignatureError> {
    let body = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or(signature)
        .trim();

    let normalized: String = body
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD
        .decode(&normalized)
        .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))?;
    Ok(normalized)
}

/// Sign `doc` as a host holding `private_key_pem` would.
///
/// Sets `matchHostPK` to `public_key` and replaces any existing signature.
pub fn sign_document(
    doc: &MatchDocument,
    public_key: &str,
    private_key_pem: &str,
) -> Result<MatchDocument, SignatureError> {
    let mut signed = doc.clone();
    signed.insert(fields::MATCH_HOST_PK, Value::String(public_key.to_string()));
    signed.remove(fields::MATCH_HOST_SIGNATURE);

    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    let payload = signing_payload(&signed);
    let signature = crypto::sign(payload.as_bytes(), &key, Algorithm::RS256)
        .map_err(|e| SignatureError::Crypto(e.to_string()))?;

    signed.insert(
        fields::MATCH_HOST_SIGNATURE,
        Value::String(format!("{}{}", SIGNATURE_PREFIX, signature)),
    );
    Ok(signed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::fixtures::{base_match, doc};
    use serde_json::json;

    const HOST_PRIVATE: &str = include_str!("testdata/host_private.pem");
    const HOST_PUBLIC: &str = include_str!("testdata/host_public.pem");
    const OTHER_PUBLIC: &str = include_str!("testdata/other_public.pem");

    fn signed_base() -> MatchDocument {
        sign_document(&doc(base_match()), HOST_PUBLIC, HOST_PRIVATE).unwrap()
    }

    #[test]
    fn test_valid_signature_verifies() {
        let verifier = RsaSignatureVerifier::new();
        assert_eq!(verifier.verify(&signed_base()), Ok(true));
    }

    #[test]
    fn test_compact_key_verifies() {
        let compact = compact_public_key(HOST_PUBLIC);
        assert!(compact.starts_with('0'));

        let signed = sign_document(&doc(base_match()), &compact, HOST_PRIVATE).unwrap();
        assert_eq!(RsaSignatureVerifier::new().verify(&signed), Ok(true));
    }

    #[test]
    fn test_tampered_field_fails() {
        let mut signed = signed_base();
        signed.insert("playClock", json!(11));
        assert_eq!(RsaSignatureVerifier::new().verify(&signed), Ok(false));
    }

    #[test]
    fn test_wrong_key_fails() {
        let mut signed = signed_base();
        signed.insert(fields::MATCH_HOST_PK, json!(OTHER_PUBLIC));
        assert_eq!(RsaSignatureVerifier::new().verify(&signed), Ok(false));
    }

    #[test]
    fn test_standard_alphabet_signature_accepted() {
        let mut signed = signed_base();
        let sig = signed
            .optional_str(fields::MATCH_HOST_SIGNATURE)
            .unwrap()
            .unwrap()
            .trim_start_matches(SIGNATURE_PREFIX)
            .to_string();
        let raw = URL_SAFE_NO_PAD.decode(&sig).unwrap();
        signed.insert(fields::MATCH_HOST_SIGNATURE, json!(STANDARD.encode(raw)));

        assert_eq!(RsaSignatureVerifier::new().verify(&signed), Ok(true));
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let signed = signed_base();
        let mut entries: Vec<(String, Value)> = signed
            .as_map()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.reverse();
        let reordered: serde_json::Map<String, Value> = entries.into_iter().collect();
        let reordered = MatchDocument::from_value(Value::Object(reordered)).unwrap();

        assert_eq!(RsaSignatureVerifier::new().verify(&reordered), Ok(true));
    }

    #[test]
    fn test_missing_fields() {
        let verifier = RsaSignatureVerifier::new();
        assert_eq!(verifier.verify(&doc(base_match())), Err(SignatureError::MissingKey));

        let mut value = base_match();
        value["matchHostPK"] = json!(HOST_PUBLIC);
        assert_eq!(verifier.verify(&doc(value)), Err(SignatureError::MissingSignature));
    }

    #[test]
    fn test_garbage_inputs_are_errors() {
        let mut value = base_match();
        value["matchHostPK"] = json!("not a key");
        value["matchHostSignature"] = json!("abc");
        assert!(matches!(
            RsaSignatureVerifier::new().verify(&doc(value)),
            Err(SignatureError::InvalidKey(_))
        ));

        let mut signed = signed_base();
        signed.insert(fields::MATCH_HOST_SIGNATURE, json!("***"));
        assert!(matches!(
            RsaSignatureVerifier::new().verify(&signed),
            Err(SignatureError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_stub_accepts_any_nonempty_signature() {
        let mut value = base_match();
        value["matchHostPK"] = json!("0AAAA");
        value["matchHostSignature"] = json!("anything");
        assert_eq!(StubSignatureVerifier.verify(&doc(value)), Ok(true));
    }
}
