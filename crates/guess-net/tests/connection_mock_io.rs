//! Connection read-loop behaviour against scripted streams.

use std::sync::Arc;
use std::time::Duration;

use guess_core::{encode_message, ConcurrentQueue, ConnectionId, MessageKind, WireMessage};
use guess_net::{Connection, Role};
use tokio::runtime::Handle;
use tokio_test::io::Builder;

async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_scripted_records_are_delivered_then_eof_closes() {
    // Arrange: two records (the second split in two reads) followed by EOF
    let first = encode_message(&WireMessage::new(MessageKind::Response, 11));
    let second = encode_message(&WireMessage::signal(MessageKind::Finish));
    let stream = Builder::new()
        .read(&first)
        .read(&second[..7])
        .read(&second[7..])
        .build();
    let inbound = Arc::new(ConcurrentQueue::new());
    let conn = Connection::open(
        stream,
        Role::ServerSide,
        ConnectionId(3),
        Arc::clone(&inbound),
        Handle::current(),
    );

    // Act
    conn.begin_receiving();
    wait_for(|| !conn.is_connected()).await;

    // Assert
    assert!(!conn.is_connected());
    let messages: Vec<_> = std::iter::from_fn(|| inbound.pop_front()).collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message.value(), 11);
    assert_eq!(messages[1].message.kind(), MessageKind::Finish);
    assert!(messages.iter().all(|e| e.origin == Some(ConnectionId(3))));
}

#[tokio::test]
async fn test_truncated_record_before_eof_is_discarded() {
    let bytes = encode_message(&WireMessage::new(MessageKind::Response, 1));
    let stream = Builder::new().read(&bytes[..6]).build();
    let inbound = Arc::new(ConcurrentQueue::new());
    let conn = Connection::open(
        stream,
        Role::ClientSide,
        ConnectionId(0),
        Arc::clone(&inbound),
        Handle::current(),
    );

    conn.begin_receiving();
    wait_for(|| !conn.is_connected()).await;

    assert!(!conn.is_connected());
    assert!(inbound.is_empty());
}
