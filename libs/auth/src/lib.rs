//! Order authentication: canonicalisation, envelope framing, Ed25519
//!
//! The verifier accepts an order plus a base64 signature and answers
//! verified/invalid. The canonical byte form lives here and only here;
//! every other crate treats signatures as opaque.

pub mod canonical;
pub mod envelope;
pub mod verify;

pub use canonical::{canonical_cancellation_bytes, canonical_order, canonical_order_bytes};
pub use envelope::{framed_message, message_digest, MessageKind, SIGNED_MESSAGE_DOMAIN};
pub use verify::{
    account_address, decode_account, sign_cancellation, sign_order, signing_key_from_secret,
    verify_cancellation, verify_order,
};

use thiserror::Error;

/// Authentication failures, each mapped to a distinct rejection reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid account address: {0}")]
    BadAddress(String),

    #[error("signature verification failed")]
    BadSignature,

    #[error("malformed order: {0}")]
    MalformedOrder(String),
}
