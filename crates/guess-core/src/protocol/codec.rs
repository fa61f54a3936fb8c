//! Binary codec for encoding and decoding Guess-Wire protocol messages.
//!
//! Wire format:
//! ```text
//! [kind:4][value:8]
//! ```
//! Total record size: 12 bytes. All multi-byte integers are big-endian.

use thiserror::Error;

use crate::protocol::messages::{MessageKind, WireMessage, WIRE_MESSAGE_SIZE};

/// Errors that can occur while decoding a record.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than one record.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The kind tag is not part of the enumeration.
    #[error("unknown message kind: {0}")]
    UnknownMessageKind(u32),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`WireMessage`] into its fixed-size record.
///
/// # Examples
///
/// ```rust
/// use guess_core::protocol::{decode_message, encode_message, MessageKind, WireMessage};
///
/// let msg = WireMessage::new(MessageKind::Response, 42);
/// let bytes = encode_message(&msg);
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &WireMessage) -> [u8; WIRE_MESSAGE_SIZE] {
    let mut buf = [0u8; WIRE_MESSAGE_SIZE];
    buf[..4].copy_from_slice(&(msg.kind() as u32).to_be_bytes());
    buf[4..].copy_from_slice(&msg.value().to_be_bytes());
    buf
}

/// Decodes one [`WireMessage`] from the beginning of `bytes`.
///
/// Returns the message and the number of bytes consumed (always
/// [`WIRE_MESSAGE_SIZE`]); any bytes after the first record are left alone.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] when fewer than 12 bytes are
/// available and [`ProtocolError::UnknownMessageKind`] for an unknown tag.
pub fn decode_message(bytes: &[u8]) -> Result<(WireMessage, usize), ProtocolError> {
    if bytes.len() < WIRE_MESSAGE_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: WIRE_MESSAGE_SIZE,
            available: bytes.len(),
        });
    }

    let tag = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let kind = MessageKind::try_from(tag).map_err(|_| ProtocolError::UnknownMessageKind(tag))?;

    let mut value = [0u8; 8];
    value.copy_from_slice(&bytes[4..WIRE_MESSAGE_SIZE]);

    Ok((
        WireMessage::new(kind, i64::from_be_bytes(value)),
        WIRE_MESSAGE_SIZE,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_places_kind_before_value_big_endian() {
        // Arrange
        let msg = WireMessage::new(MessageKind::Less, 0x0102_0304_0506_0708);

        // Act
        let bytes = encode_message(&msg);

        // Assert
        assert_eq!(
            bytes,
            [0, 0, 0, 3, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn test_encode_negative_value_uses_twos_complement() {
        let bytes = encode_message(&WireMessage::new(MessageKind::Response, -1));
        assert_eq!(&bytes[4..], &[0xFF; 8]);
    }

    #[test]
    fn test_round_trip_every_kind_and_boundary_value() {
        for kind in MessageKind::ALL {
            for value in [0, -1, 1, i64::MIN, i64::MAX] {
                let msg = WireMessage::new(kind, value);
                let (decoded, consumed) = decode_message(&encode_message(&msg)).unwrap();
                assert_eq!(decoded, msg);
                assert_eq!(consumed, WIRE_MESSAGE_SIZE);
            }
        }
    }

    #[test]
    fn test_decode_short_input_returns_insufficient_data() {
        // Arrange
        let bytes = encode_message(&WireMessage::signal(MessageKind::Equals));

        // Act
        let result = decode_message(&bytes[..7]);

        // Assert
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientData {
                needed: 12,
                available: 7
            })
        );
    }

    #[test]
    fn test_decode_empty_input_returns_insufficient_data() {
        assert!(matches!(
            decode_message(&[]),
            Err(ProtocolError::InsufficientData { available: 0, .. })
        ));
    }

    #[test]
    fn test_decode_unknown_kind_is_rejected() {
        // Arrange: tag 9 is outside the enumeration
        let mut bytes = [0u8; WIRE_MESSAGE_SIZE];
        bytes[3] = 9;

        // Act / Assert
        assert_eq!(
            decode_message(&bytes),
            Err(ProtocolError::UnknownMessageKind(9))
        );
    }

    #[test]
    fn test_decode_leaves_trailing_bytes_unconsumed() {
        // Arrange: two records back to back
        let first = WireMessage::new(MessageKind::Response, 10);
        let second = WireMessage::new(MessageKind::Response, 20);
        let mut buf = encode_message(&first).to_vec();
        buf.extend_from_slice(&encode_message(&second));

        // Act
        let (a, n) = decode_message(&buf).unwrap();
        let (b, m) = decode_message(&buf[n..]).unwrap();

        // Assert
        assert_eq!((a, b), (first, second));
        assert_eq!(n + m, buf.len());
    }
}
