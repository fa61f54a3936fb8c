//! Integration tests for the guess-core protocol codec.
//!
//! These tests go through the public API only, the same way the transport
//! crate uses it: encode a message, feed the bytes to the decoder, and compare.

use guess_core::{
    decode_message, encode_message, Envelope, MessageKind, ProtocolError, WireMessage,
    WIRE_MESSAGE_SIZE,
};

/// Encodes a message and then decodes it, asserting the whole record is consumed.
fn roundtrip(msg: WireMessage) -> WireMessage {
    let bytes = encode_message(&msg);
    assert_eq!(bytes.len(), WIRE_MESSAGE_SIZE);
    let (decoded, consumed) = decode_message(&bytes).expect("decode must succeed");
    assert_eq!(consumed, bytes.len(), "all bytes must be consumed");
    decoded
}

#[test]
fn test_roundtrip_broadcast_signal() {
    let original = WireMessage::signal(MessageKind::Broadcast);
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_roundtrip_response_with_extreme_payloads() {
    for value in [0, -1, i64::MIN, i64::MAX] {
        let original = WireMessage::new(MessageKind::Response, value);
        let decoded = roundtrip(original);
        assert_eq!(decoded.kind(), MessageKind::Response);
        assert_eq!(decoded.value(), value);
    }
}

#[test]
fn test_roundtrip_finish_signal() {
    let original = WireMessage::signal(MessageKind::Finish);
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_stream_of_records_decodes_in_order() {
    // Arrange: a byte stream as it would arrive on one connection
    let sent: Vec<WireMessage> = (0..10)
        .map(|i| WireMessage::new(MessageKind::Response, i * 11))
        .collect();
    let stream: Vec<u8> = sent.iter().flat_map(|m| encode_message(m)).collect();

    // Act
    let received: Vec<WireMessage> = stream
        .chunks(WIRE_MESSAGE_SIZE)
        .map(|chunk| decode_message(chunk).unwrap().0)
        .collect();

    // Assert
    assert_eq!(sent, received);
}

#[test]
fn test_truncated_record_never_yields_a_message() {
    let bytes = encode_message(&WireMessage::new(MessageKind::Greater, 5));
    for len in 0..WIRE_MESSAGE_SIZE {
        assert!(matches!(
            decode_message(&bytes[..len]),
            Err(ProtocolError::InsufficientData { .. })
        ));
    }
}

#[test]
fn test_envelope_keeps_message_and_origin() {
    let msg = WireMessage::new(MessageKind::Response, 3);
    let envelope = Envelope::new(msg, None);
    assert_eq!(envelope.message, msg);
    assert!(envelope.origin.is_none());
}
