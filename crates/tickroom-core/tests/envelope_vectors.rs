//! Envelope codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use tickroom_core::protocol::commands::{Ping, RegisterNode, UpdateNode};
use tickroom_core::protocol::envelope::{decode, peek_command};
use tickroom_core::protocol::{NodeType, Point};

fn load(name: &str) -> Vec<u8> {
    fs::read(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn peek_reads_header_only() {
    let raw = load("envelope_register_node.json");
    let h = peek_command(&raw).unwrap();
    assert_eq!(h.command, "register_node");
    assert_eq!(h.sent_at, 1700000000123);
}

#[test]
fn decode_register_node() {
    let raw = load("envelope_register_node.json");
    let env = decode::<RegisterNode>(&raw).unwrap();
    assert_eq!(env.fields.player_id, 1);
    assert_eq!(env.fields.node.kind, NodeType::Arm);
    assert_eq!(env.fields.node.label, "your left arm!");
    assert_eq!(env.fields.node.position, Point::new(-1.0, 1.0, 0.0));
    assert_eq!(env.fields.node.asset, "box");
}

#[test]
fn register_node_rejects_named_node_type() {
    let raw = String::from_utf8(load("envelope_register_node.json"))
        .unwrap()
        .replace("\"type\":2", "\"type\":\"arm\"");
    let err = decode::<RegisterNode>(raw.as_bytes()).unwrap_err();
    assert_eq!(err.code().as_str(), "DECODE");
}

#[test]
fn decode_update_node_accepts_integer_coordinates() {
    let raw = load("envelope_update_node.json");
    let env = decode::<UpdateNode>(&raw).unwrap();
    assert_eq!(env.command, "update_node");
    assert_eq!(env.fields.node_id, 2);
    assert_eq!(env.fields.position, Point::new(1.0, 2.0, 3.0));
    assert_eq!(env.fields.rotation, Point::default());
}

#[test]
fn unknown_fields_are_ignored() {
    let raw = load("envelope_unknown_fields.json");
    let env = decode::<Ping>(&raw).unwrap();
    assert_eq!(env.command, "ping");
    assert_eq!(env.sent_at, 99);
}

#[test]
fn missing_header_is_a_decode_error() {
    let raw = load("envelope_no_command.json");
    let e = peek_command(&raw).unwrap_err();
    assert_eq!(e.code().as_str(), "DECODE");
}

#[test]
fn payload_of_wrong_shape_is_a_decode_error() {
    // header is fine, the typed fields are not
    let raw = load("envelope_update_node.json");
    let e = decode::<RegisterNode>(&raw).unwrap_err();
    assert_eq!(e.code().as_str(), "DECODE");
}
