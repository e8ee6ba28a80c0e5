//! Ed25519 verification and signing over framed canonical payloads

use crate::canonical::{canonical_cancellation_bytes, canonical_order_bytes};
use crate::envelope::{message_digest, MessageKind};
use crate::AuthError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use types::order::Order;

/// Decode a text account address (G...) to its Ed25519 verifying key.
pub fn decode_account(address: &str) -> Result<VerifyingKey, AuthError> {
    let key = stellar_strkey::ed25519::PublicKey::from_string(address)
        .map_err(|_| AuthError::BadAddress(address.to_string()))?;
    VerifyingKey::from_bytes(&key.0).map_err(|_| AuthError::BadAddress(address.to_string()))
}

/// Text account address (G...) for a verifying key.
pub fn account_address(key: &VerifyingKey) -> String {
    stellar_strkey::ed25519::PublicKey(key.to_bytes()).to_string()
}

/// Load a signing key from its secret form: an S... strkey seed or 64 hex
/// characters.
pub fn signing_key_from_secret(secret: &str) -> Result<SigningKey, AuthError> {
    if let Ok(seed) = stellar_strkey::ed25519::PrivateKey::from_string(secret) {
        return Ok(SigningKey::from_bytes(&seed.0));
    }
    let bytes = hex::decode(secret).map_err(|_| AuthError::BadAddress("secret key".into()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| AuthError::BadAddress("secret key".into()))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn decode_signature(signature_b64: &str) -> Result<Signature, AuthError> {
    let bytes = BASE64
        .decode(signature_b64)
        .map_err(|_| AuthError::BadSignature)?;
    let raw: [u8; 64] = bytes.try_into().map_err(|_| AuthError::BadSignature)?;
    Ok(Signature::from_bytes(&raw))
}

/// Verify an order's signature against its `user_address`.
pub fn verify_order(order: &Order, signature_b64: &str) -> Result<(), AuthError> {
    let key = decode_account(&order.user_address)?;
    let payload = canonical_order_bytes(order)?;
    let digest = message_digest(MessageKind::Order, &payload);
    let signature = decode_signature(signature_b64)?;
    key.verify(&digest, &signature)
        .map_err(|_| AuthError::BadSignature)
}

/// Verify a cancellation envelope against the claimed owner address.
pub fn verify_cancellation(
    order_id: &str,
    user_address: &str,
    timestamp: i64,
    signature_b64: &str,
) -> Result<(), AuthError> {
    let key = decode_account(user_address)?;
    let payload = canonical_cancellation_bytes(order_id, user_address, timestamp);
    let digest = message_digest(MessageKind::Cancellation, &payload);
    let signature = decode_signature(signature_b64)?;
    key.verify(&digest, &signature)
        .map_err(|_| AuthError::BadSignature)
}

/// Sign an order, returning the base64 signature clients submit.
///
/// Mirrors the verification path exactly; client SDKs and tests use this to
/// produce valid submissions without external tooling.
pub fn sign_order(order: &Order, key: &SigningKey) -> Result<String, AuthError> {
    let payload = canonical_order_bytes(order)?;
    let digest = message_digest(MessageKind::Order, &payload);
    Ok(BASE64.encode(key.sign(&digest).to_bytes()))
}

/// Sign a cancellation envelope.
pub fn sign_cancellation(
    order_id: &str,
    user_address: &str,
    timestamp: i64,
    key: &SigningKey,
) -> String {
    let payload = canonical_cancellation_bytes(order_id, user_address, timestamp);
    let digest = message_digest(MessageKind::Cancellation, &payload);
    BASE64.encode(key.sign(&digest).to_bytes())
}
