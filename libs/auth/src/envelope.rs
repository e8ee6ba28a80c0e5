//! Signed-message envelope
//!
//! Frames canonical payload bytes the way the Stellar ecosystem frames
//! application-level messages: a fixed domain separator, a payload type
//! tag, and a varint length ahead of the payload, then SHA-256. The domain
//! prefix keeps an order signature from doubling as a ledger transaction
//! signature; the type tag keeps an order from doubling as a cancellation.

use sha2::{Digest, Sha256};

/// Domain separator shared by all application-level signed messages.
pub const SIGNED_MESSAGE_DOMAIN: &[u8] = b"Stellar Signed Message:\n";

/// The kind of payload being framed, each with its own type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Order,
    Cancellation,
}

impl MessageKind {
    fn type_tag(&self) -> &'static [u8] {
        match self {
            MessageKind::Order => b"darkpool.order",
            MessageKind::Cancellation => b"darkpool.cancel",
        }
    }
}

/// Unsigned LEB128 varint.
fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Full framed message: `domain ∥ type_tag ∥ varint(len) ∥ payload`.
pub fn framed_message(kind: MessageKind, payload: &[u8]) -> Vec<u8> {
    let tag = kind.type_tag();
    let mut out = Vec::with_capacity(SIGNED_MESSAGE_DOMAIN.len() + tag.len() + 10 + payload.len());
    out.extend_from_slice(SIGNED_MESSAGE_DOMAIN);
    out.extend_from_slice(tag);
    write_varint(&mut out, payload.len() as u64);
    out.extend_from_slice(payload);
    out
}

/// SHA-256 digest of the framed message; this is what gets signed.
pub fn message_digest(kind: MessageKind, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(framed_message(kind, payload));
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let framed = framed_message(MessageKind::Order, b"abc");
        let mut expected = Vec::new();
        expected.extend_from_slice(b"Stellar Signed Message:\n");
        expected.extend_from_slice(b"darkpool.order");
        expected.push(3);
        expected.extend_from_slice(b"abc");
        assert_eq!(framed, expected);
    }

    #[test]
    fn test_varint_multi_byte() {
        let payload = vec![0u8; 300];
        let framed = framed_message(MessageKind::Order, &payload);
        let prefix_len = SIGNED_MESSAGE_DOMAIN.len() + b"darkpool.order".len();
        // 300 = 0b10_0101100 -> 0xAC 0x02
        assert_eq!(&framed[prefix_len..prefix_len + 2], &[0xAC, 0x02]);
    }

    #[test]
    fn test_digest_depends_on_kind() {
        assert_ne!(
            message_digest(MessageKind::Order, b"payload"),
            message_digest(MessageKind::Cancellation, b"payload")
        );
    }

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(
            message_digest(MessageKind::Order, b"payload"),
            message_digest(MessageKind::Order, b"payload")
        );
    }
}
