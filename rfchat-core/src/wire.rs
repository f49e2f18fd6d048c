//! Envelope framing: header byte + 2-byte big-endian id + payload bytes.

use crate::compress;
use crate::protocol::{self, CompressionKind, MessageId, MessageKind, ProtocolError};

/// Payload bytes start here: one header byte plus the two id bytes.
pub const PAYLOAD_OFFSET: usize = 3;

/// Encode a full envelope. The payload may be empty (an ack carries none).
pub fn encode_envelope(
    kind: MessageKind,
    compression: CompressionKind,
    id: MessageId,
    text: &str,
) -> Vec<u8> {
    let payload = compress::encode_payload(text, compression);
    let mut out = Vec::with_capacity(PAYLOAD_OFFSET + payload.len());
    out.push(protocol::encode_header(kind, compression));
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Decoded view of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: MessageKind,
    pub compression: CompressionKind,
    pub id: MessageId,
    pub text: String,
}

/// Decode an envelope. Anything under 3 bytes is `Truncated`; header and
/// payload codec errors propagate unchanged.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, ProtocolError> {
    if bytes.len() < PAYLOAD_OFFSET {
        return Err(ProtocolError::Truncated(bytes.len()));
    }
    let (kind, compression) = protocol::decode_header(bytes[0])?;
    let id = MessageId::from_be_bytes([bytes[1], bytes[2]]);
    let text = compress::decode_payload(&bytes[PAYLOAD_OFFSET..], compression)?;
    Ok(Envelope {
        kind,
        compression,
        id,
        text,
    })
}

/// One destination-addressed outbound frame. Created by the sender, handed
/// by value through the queue, consumed by the link adapter. The core passes
/// callsigns through as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub destination: String,
    pub source: String,
    pub envelope: Vec<u8>,
}

impl Frame {
    /// Build a MSG frame carrying user text.
    pub fn message(
        destination: &str,
        source: &str,
        id: MessageId,
        text: &str,
        compression: CompressionKind,
    ) -> Self {
        Frame {
            destination: destination.to_string(),
            source: source.to_string(),
            envelope: encode_envelope(MessageKind::Msg, compression, id, text),
        }
    }

    /// Build an ACK frame for a received message id. Empty payload; same
    /// compression default as outbound messages.
    pub fn ack(destination: &str, source: &str, id: MessageId) -> Self {
        Frame {
            destination: destination.to_string(),
            source: source.to_string(),
            envelope: encode_envelope(MessageKind::Ack, CompressionKind::Dictionary, id, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip() {
        let id = MessageId::new(4242).unwrap();
        for compression in [CompressionKind::None, CompressionKind::Dictionary] {
            let bytes = encode_envelope(MessageKind::Msg, compression, id, "hello there");
            let envelope = decode_envelope(&bytes).unwrap();
            assert_eq!(envelope.kind, MessageKind::Msg);
            assert_eq!(envelope.compression, compression);
            assert_eq!(envelope.id, id);
            assert_eq!(envelope.text, "hello there");
        }
    }

    #[test]
    fn truncated_envelopes_rejected() {
        for len in 0..PAYLOAD_OFFSET {
            let bytes = vec![0u8; len];
            assert_eq!(
                decode_envelope(&bytes),
                Err(ProtocolError::Truncated(len))
            );
        }
    }

    #[test]
    fn three_bytes_is_a_valid_empty_message() {
        let bytes = encode_envelope(
            MessageKind::Ack,
            CompressionKind::Dictionary,
            MessageId::ZERO,
            "",
        );
        assert_eq!(bytes.len(), PAYLOAD_OFFSET);
        let envelope = decode_envelope(&bytes).unwrap();
        assert_eq!(envelope.kind, MessageKind::Ack);
        assert_eq!(envelope.text, "");
    }

    #[test]
    fn sub_codec_errors_propagate() {
        // Reserved kind ordinal in the header byte's top two bits.
        assert_eq!(
            decode_envelope(&[0b10 << 6, 0, 0]),
            Err(ProtocolError::UnknownKind(2))
        );
        // Valid header, malformed raw payload.
        let mut bytes = encode_envelope(
            MessageKind::Msg,
            CompressionKind::None,
            MessageId::ZERO,
            "",
        );
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        assert_eq!(decode_envelope(&bytes), Err(ProtocolError::InvalidText));
    }

    #[test]
    fn ack_frame_has_empty_payload() {
        let frame = Frame::ack("ALICE", "BOB", MessageId::new(7).unwrap());
        let envelope = decode_envelope(&frame.envelope).unwrap();
        assert_eq!(envelope.kind, MessageKind::Ack);
        assert_eq!(envelope.id.value(), 7);
        assert!(envelope.text.is_empty());
        assert_eq!(frame.destination, "ALICE");
        assert_eq!(frame.source, "BOB");
    }
}
