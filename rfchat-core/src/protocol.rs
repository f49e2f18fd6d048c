//! rfchat wire protocol: message kinds, compression kinds, the packed header
//! byte and the 16-bit message identifier.

/// Discriminator carried in the top two bits of the header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A user text message; the receiver is expected to answer with an ack.
    Msg,
    /// Acknowledgment of a previously received message, correlated by id.
    Ack,
}

impl MessageKind {
    fn wire_value(self) -> u8 {
        match self {
            MessageKind::Msg => 0,
            MessageKind::Ack => 1,
        }
    }

    /// Map a 2-bit ordinal back to a kind. Ordinals 2 and 3 are reserved and
    /// rejected rather than mapped to anything.
    fn from_wire(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(MessageKind::Msg),
            1 => Ok(MessageKind::Ack),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

/// Payload transform discriminator carried in bits 5-4 of the header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    /// Payload is the raw UTF-8 bytes of the text.
    None,
    /// Payload is dictionary-compressed (see the `compress` module).
    Dictionary,
}

impl CompressionKind {
    fn wire_value(self) -> u8 {
        match self {
            CompressionKind::None => 0,
            CompressionKind::Dictionary => 1,
        }
    }

    fn from_wire(value: u8) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(CompressionKind::None),
            1 => Ok(CompressionKind::Dictionary),
            other => Err(ProtocolError::UnsupportedCompression(other)),
        }
    }
}

/// Pack kind and compression into the header byte. Fields are MSB-first on
/// the wire: kind in bits 7-6, compression in bits 5-4, low nibble always
/// zero.
pub fn encode_header(kind: MessageKind, compression: CompressionKind) -> u8 {
    (kind.wire_value() << 6) | (compression.wire_value() << 4)
}

/// Unpack the header byte. The low nibble is ignored; reserved ordinals in
/// either 2-bit field are an error, not a silent remap.
pub fn decode_header(byte: u8) -> Result<(MessageKind, CompressionKind), ProtocolError> {
    let kind = MessageKind::from_wire((byte >> 6) & 0b11)?;
    let compression = CompressionKind::from_wire((byte >> 4) & 0b11)?;
    Ok((kind, compression))
}

/// Message identifier, 16 bits on the wire (big-endian). Out-of-range values
/// are rejected at construction so an invalid id never exists as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u16);

impl MessageId {
    pub const ZERO: MessageId = MessageId(0);

    pub fn new(value: u32) -> Result<Self, ProtocolError> {
        if value > u16::MAX as u32 {
            return Err(ProtocolError::IdOutOfRange(value));
        }
        Ok(MessageId(value as u16))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    /// Successor for the session counter; wraps at 65535.
    pub fn wrapping_next(self) -> MessageId {
        MessageId(self.0.wrapping_add(1))
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Any 2-byte value is a valid id, so this cannot fail.
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        MessageId(u16::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors building or decoding protocol values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown message kind ordinal {0}")]
    UnknownKind(u8),
    #[error("unsupported compression kind ordinal {0}")]
    UnsupportedCompression(u8),
    #[error("message id {0} does not fit in 16 bits")]
    IdOutOfRange(u32),
    #[error("envelope truncated: got {0} bytes, need at least 3")]
    Truncated(usize),
    #[error("payload is not valid text")]
    InvalidText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_all_combinations() {
        let kinds = [MessageKind::Msg, MessageKind::Ack];
        let compressions = [CompressionKind::None, CompressionKind::Dictionary];
        for kind in kinds {
            for compression in compressions {
                let byte = encode_header(kind, compression);
                assert_eq!(byte & 0x0F, 0, "reserved bits must be zero");
                assert_eq!(decode_header(byte).unwrap(), (kind, compression));
            }
        }
    }

    #[test]
    fn header_byte_layout_is_msb_first() {
        // Wire bytes fixed by deployed peers: MSG+dictionary is 0x10,
        // ACK+raw is 0x40.
        assert_eq!(
            encode_header(MessageKind::Msg, CompressionKind::Dictionary),
            0x10
        );
        assert_eq!(encode_header(MessageKind::Ack, CompressionKind::None), 0x40);
        assert_eq!(
            decode_header(0x10).unwrap(),
            (MessageKind::Msg, CompressionKind::Dictionary)
        );
    }

    #[test]
    fn header_rejects_reserved_kind_ordinals() {
        for ordinal in [2u8, 3] {
            assert_eq!(
                decode_header(ordinal << 6),
                Err(ProtocolError::UnknownKind(ordinal))
            );
        }
    }

    #[test]
    fn header_rejects_reserved_compression_ordinals() {
        for ordinal in [2u8, 3] {
            assert_eq!(
                decode_header(ordinal << 4),
                Err(ProtocolError::UnsupportedCompression(ordinal))
            );
        }
    }

    #[test]
    fn header_decode_ignores_low_bits() {
        let byte = encode_header(MessageKind::Ack, CompressionKind::Dictionary) | 0x0F;
        assert_eq!(
            decode_header(byte).unwrap(),
            (MessageKind::Ack, CompressionKind::Dictionary)
        );
    }

    #[test]
    fn message_id_bounds() {
        for value in [0u32, 1, 65_535] {
            let id = MessageId::new(value).unwrap();
            assert_eq!(MessageId::from_be_bytes(id.to_be_bytes()), id);
        }
        assert_eq!(
            MessageId::new(65_536),
            Err(ProtocolError::IdOutOfRange(65_536))
        );
    }

    #[test]
    fn message_id_encodes_big_endian() {
        let id = MessageId::new(0x1234).unwrap();
        assert_eq!(id.to_be_bytes(), [0x12, 0x34]);
    }

    #[test]
    fn message_id_counter_wraps() {
        let id = MessageId::new(65_535).unwrap();
        assert_eq!(id.wrapping_next(), MessageId::ZERO);
    }
}
