#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::time::Duration;

use futures_util::future::join_all;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use tickroom_core::error::RoomError;
use tickroom_core::protocol::commands::{Ping, Pong};
use tickroom_core::protocol::envelope::{decode, encode_at};
use tickroom_core::protocol::{Node, NodeType, Point};
use tickroom_server::client::Client;
use tickroom_server::transport::{FrameReader, FrameWriter};

use common::{start, test_config, within};

async fn joined(addr: &str, username: &str) -> Client {
    let mut c = Client::new(addr, username);
    within(c.connect()).await.unwrap();
    c
}

async fn raw(addr: &str) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (r, w) = stream.into_split();
    (FrameReader::new(r, 64 * 1024), FrameWriter::new(w))
}

#[tokio::test]
async fn distinct_usernames_get_increasing_ids() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let mut alice = Client::new(&addr, "alice");
    let v1 = within(alice.connect()).await.unwrap();
    let mut bob = Client::new(&addr, "bob");
    let v2 = within(bob.connect()).await.unwrap();

    assert!(v1.can_proceed && v2.can_proceed);
    assert_eq!(v1.message, "Welcome to the server!");
    assert_eq!(v1.player_id, 1);
    assert_eq!(v2.player_id, 2);

    let names: Vec<&str> = v2.players.iter().map(|p| p.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    assert_eq!(srv.room().player_count().await, 2);
}

#[tokio::test]
async fn duplicate_username_is_rejected_while_first_is_live() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let first = joined(&addr, "carol").await;
    assert_eq!(first.player_id(), 1);

    let mut second = Client::new(&addr, "carol");
    let err = within(second.connect()).await.unwrap_err();
    match err {
        RoomError::ClientRejected(msg) => assert_eq!(msg, "Sorry. Connection rejected."),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(srv.room().player_count().await, 1);

    // The refused attempt did not burn an id.
    let dave = joined(&addr, "dave").await;
    assert_eq!(dave.player_id(), 2);
}

#[tokio::test]
async fn empty_username_is_rejected() {
    let srv = start(test_config()).await;
    let mut c = Client::new(srv.room_addr().to_string(), "");
    let err = within(c.connect()).await.unwrap_err();
    assert_eq!(err.code().as_str(), "CLIENT_REJECTED");
    assert_eq!(srv.room().player_count().await, 0);
}

#[tokio::test]
async fn ping_echoes_sent_at() {
    let srv = start(test_config()).await;
    let (mut r, mut w) = raw(&srv.room_addr().to_string()).await;

    w.write_frame(&encode_at("ping", &Ping {}, 1_234_567).unwrap())
        .await
        .unwrap();
    let frame = within(r.read_frame()).await.unwrap();
    let pong = decode::<Pong>(&frame).unwrap();
    assert_eq!(pong.command, "pong");
    assert_eq!(pong.fields.received_at, 1_234_567);
}

#[tokio::test]
async fn unknown_command_keeps_connection_usable() {
    let srv = start(test_config()).await;
    let (mut r, mut w) = raw(&srv.room_addr().to_string()).await;

    w.write_frame(&encode_at("teleport", &serde_json::json!({"to": "moon"}), 1).unwrap())
        .await
        .unwrap();
    w.write_frame(&encode_at("ping", &Ping {}, 2).unwrap())
        .await
        .unwrap();

    let frame = within(r.read_frame()).await.unwrap();
    assert_eq!(decode::<Pong>(&frame).unwrap().fields.received_at, 2);
}

#[tokio::test]
async fn calls_before_connect_fail() {
    let c = Client::new("127.0.0.1:1", "nobody");
    let err = c.ping().await.unwrap_err();
    assert_eq!(err.code().as_str(), "CLIENT_NOT_CONNECTED");
}

#[tokio::test]
async fn environment_is_served_after_join() {
    let srv = start(test_config()).await;
    let c = joined(&srv.room_addr().to_string(), "erin").await;

    let env = within(c.environment()).await.unwrap();
    assert_eq!(env.main, "world");
    assert_eq!(env.asset_keys["world"], "room.gsml");
}

#[tokio::test]
async fn node_update_reaches_other_players() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let alice = joined(&addr, "alice").await;
    let bob = joined(&addr, "bob").await;

    let mut ids = Vec::new();
    for label in ["L1", "L2", "L3"] {
        ids.push(
            within(alice.register_node(Node::new(NodeType::Arm, label)))
                .await
                .unwrap(),
        );
    }
    assert_eq!(ids, vec![1, 2, 3]);

    let target = Point::new(1.0, 2.0, 3.0);
    within(alice.update_node(2, target, Point::default()))
        .await
        .unwrap();

    let seen = within(bob.next_update()).await.unwrap();
    assert_eq!(seen.player_id, alice.player_id());
    assert_eq!(seen.node_id, 2);
    assert_eq!(seen.position, target);

    // The originator gets the relay as well.
    let echoed = within(alice.next_update()).await.unwrap();
    assert_eq!(echoed.node_id, 2);

    let roster = srv.room().roster().await;
    let stored = roster
        .iter()
        .find(|p| p.id == alice.player_id())
        .and_then(|p| p.nodes.iter().find(|n| n.id == 2))
        .unwrap();
    assert_eq!(stored.position, target);
    assert_eq!(stored.label, "L2");
}

#[tokio::test]
async fn concurrent_registrations_get_distinct_sequential_ids() {
    let srv = start(test_config()).await;
    let c = joined(&srv.room_addr().to_string(), "octo").await;

    let calls = (0..8).map(|i| c.register_node(Node::new(NodeType::Arm, format!("arm{i}"))));
    let mut ids: Vec<u64> = within(join_all(calls))
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}

#[tokio::test]
async fn update_for_missing_node_is_dropped() {
    let srv = start(test_config()).await;
    let c = joined(&srv.room_addr().to_string(), "fred").await;

    within(c.update_node(99, Point::new(5.0, 5.0, 5.0), Point::default()))
        .await
        .unwrap();

    // The connection still answers and nothing was relayed.
    within(c.ping()).await.unwrap();
    let relayed = tokio::time::timeout(Duration::from_millis(100), c.next_update()).await;
    assert!(relayed.is_err(), "unexpected relay: {relayed:?}");
}

#[tokio::test]
async fn abrupt_close_prunes_player() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let alice = joined(&addr, "alice").await;
    let bob = joined(&addr, "bob").await;
    assert_eq!(srv.room().player_count().await, 2);

    bob.close().await;
    drop(bob);

    within(async {
        while srv.room().player_count().await != 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    let roster = srv.room().roster().await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].username, "alice");

    // Broadcasts keep flowing to whoever is left.
    within(alice.register_node(Node::new(NodeType::Head, "head")))
        .await
        .unwrap();
    within(alice.update_node(1, Point::new(0.0, 1.0, 0.0), Point::default()))
        .await
        .unwrap();
    assert_eq!(within(alice.next_update()).await.unwrap().node_id, 1);

    // The name is free again.
    let bob_again = joined(&addr, "bob").await;
    assert_eq!(bob_again.player_id(), 3);
}

#[tokio::test]
async fn requests_after_a_relay_get_their_own_replies() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let alice = joined(&addr, "alice").await;
    let bob = joined(&addr, "bob").await;

    let head = within(alice.register_node(Node::new(NodeType::Head, "head")))
        .await
        .unwrap();
    within(alice.update_node(head, Point::new(0.0, 2.0, 0.0), Point::default()))
        .await
        .unwrap();
    // Let the relay land in bob's socket before bob asks anything.
    within(alice.next_update()).await.unwrap();

    let arm = within(bob.register_node(Node::new(NodeType::Arm, "arm")))
        .await
        .unwrap();
    assert_eq!(arm, 1);
    within(bob.ping()).await.unwrap();
    within(bob.environment()).await.unwrap();

    // The relay was queued, not lost.
    let seen = within(bob.next_update()).await.unwrap();
    assert_eq!(seen.player_id, alice.player_id());
    assert_eq!(seen.node_id, head);
}

#[tokio::test]
async fn broadcast_right_after_a_peer_dies_reaches_the_rest() {
    let srv = start(test_config()).await;
    let addr = srv.room_addr().to_string();

    let alice = joined(&addr, "alice").await;
    let bob = joined(&addr, "bob").await;
    let carol = joined(&addr, "carol").await;
    let head = within(alice.register_node(Node::new(NodeType::Head, "head")))
        .await
        .unwrap();

    bob.close().await;
    drop(bob);
    within(alice.update_node(head, Point::new(3.0, 0.0, 0.0), Point::default()))
        .await
        .unwrap();

    let seen = within(carol.next_update()).await.unwrap();
    assert_eq!(seen.node_id, head);
    assert_eq!(seen.position, Point::new(3.0, 0.0, 0.0));

    within(async {
        while srv.room().player_count().await != 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    let names: Vec<String> = srv
        .room()
        .roster()
        .await
        .into_iter()
        .map(|p| p.username)
        .collect();
    assert_eq!(names, vec!["alice", "carol"]);
}

