//! End-to-end experiment over loopback sockets: a real server endpoint driven
//! by the experiment host, and raw client endpoints standing in for players.

use std::thread;
use std::time::{Duration, Instant};

use guess_core::{ConnectionId, MessageKind, WireMessage};
use guess_net::{ClientEndpoint, ServerEndpoint};
use guess_server::application::run_experiment::ExperimentHost;

const TIMEOUT: Duration = Duration::from_secs(3);

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn next_kind(client: &ClientEndpoint) -> MessageKind {
    assert!(client.inbound().wait_timeout(TIMEOUT), "no message arrived");
    client.inbound().pop_front().unwrap().message.kind()
}

/// Pumps the server until `host` has handled `count` envelopes.
fn pump(server: &ServerEndpoint, host: &mut ExperimentHost, count: usize) {
    let mut handled = 0;
    let deadline = Instant::now() + TIMEOUT;
    while handled < count && Instant::now() < deadline {
        server.inbound().wait_timeout(Duration::from_millis(20));
        handled += server.drain_inbound(None, host);
    }
    assert_eq!(handled, count, "server handled too few messages");
}

#[test]
fn test_full_experiment_round() {
    // Arrange: a server and two players
    let mut server = ServerEndpoint::new();
    server.start_on("127.0.0.1:0".parse().unwrap()).unwrap();
    let port = server.local_addr().unwrap().port();
    let mut alice = ClientEndpoint::new();
    alice.connect("127.0.0.1", port).unwrap();
    assert!(wait_until(|| server.connection_count() == 1));
    let mut bob = ClientEndpoint::new();
    bob.connect("127.0.0.1", port).unwrap();
    assert!(wait_until(|| server.connection_count() == 2));
    let mut host = ExperimentHost::new();

    // Act: announce, then each player guesses
    assert_eq!(host.start(30, &server), 2);
    assert_eq!(next_kind(&alice), MessageKind::Broadcast);
    assert_eq!(next_kind(&bob), MessageKind::Broadcast);

    alice.send(WireMessage::new(MessageKind::Response, 10)).unwrap();
    pump(&server, &mut host, 1);
    bob.send(WireMessage::new(MessageKind::Response, 40)).unwrap();
    pump(&server, &mut host, 1);
    alice.send(WireMessage::new(MessageKind::Response, 30)).unwrap();
    pump(&server, &mut host, 1);

    // Assert
    assert_eq!(next_kind(&alice), MessageKind::Less);
    assert_eq!(next_kind(&bob), MessageKind::Greater);
    assert_eq!(next_kind(&alice), MessageKind::Equals);
    assert_eq!(host.leaderboard().wins(ConnectionId(0)), 1);
    assert_eq!(host.leaderboard().wins(ConnectionId(1)), 0);

    assert!(host.finish(&server));
    assert_eq!(next_kind(&alice), MessageKind::Finish);
    assert_eq!(next_kind(&bob), MessageKind::Finish);

    alice.disconnect();
    bob.disconnect();
    server.stop();
}

#[test]
fn test_guess_from_departed_player_is_still_judged() {
    // Arrange
    let mut server = ServerEndpoint::new();
    server.start_on("127.0.0.1:0".parse().unwrap()).unwrap();
    let mut player = ClientEndpoint::new();
    player
        .connect("127.0.0.1", server.local_addr().unwrap().port())
        .unwrap();
    assert!(wait_until(|| server.connection_count() == 1));
    let mut host = ExperimentHost::new();
    host.start(5, &server);

    // Act: the guess is queued, then the player leaves before it is handled
    player.send(WireMessage::new(MessageKind::Response, 5)).unwrap();
    assert!(server.inbound().wait_timeout(TIMEOUT));
    player.disconnect();
    assert!(wait_until(|| server
        .connection(ConnectionId(0))
        .is_some_and(|c| !c.is_connected())));
    server.drain_inbound(None, &mut host);

    // Assert
    assert_eq!(host.leaderboard().wins(ConnectionId(0)), 1);
    assert!(server.connection(ConnectionId(0)).is_none(), "closed entry pruned");
}
