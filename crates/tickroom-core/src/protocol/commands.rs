//! Command catalog and typed payloads.
//!
//! The catalog is closed: every name that may legally appear in an envelope is
//! a `Command` variant, so routing can match exhaustively. Names arriving over
//! the wire that are not in the catalog fall through to `HandlerNotFound`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::protocol::node::{Node, PlayerSummary, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ConnectRequest,
    ConnectVerdict,
    Ping,
    Pong,
    EnvironmentRequest,
    EnvironmentPackage,
    RegisterNode,
    RegisteredNode,
    UpdateNode,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::ConnectRequest,
        Command::ConnectVerdict,
        Command::Ping,
        Command::Pong,
        Command::EnvironmentRequest,
        Command::EnvironmentPackage,
        Command::RegisterNode,
        Command::RegisteredNode,
        Command::UpdateNode,
    ];

    /// Commands a client may send; each needs a server-side handler.
    pub const INBOUND: [Command; 5] = [
        Command::ConnectRequest,
        Command::Ping,
        Command::EnvironmentRequest,
        Command::RegisterNode,
        Command::UpdateNode,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::ConnectRequest => "connect_request",
            Command::ConnectVerdict => "connect_verdict",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::EnvironmentRequest => "environment_request",
            Command::EnvironmentPackage => "environment_package",
            Command::RegisterNode => "register_node",
            Command::RegisteredNode => "registered_node",
            Command::UpdateNode => "update_node",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Command::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload type bound to exactly one command name.
pub trait Message: Serialize + DeserializeOwned + Send + Sync {
    const COMMAND: Command;
}

macro_rules! message {
    ($ty:ty => $cmd:ident) => {
        impl Message for $ty {
            const COMMAND: Command = Command::$cmd;
        }
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectVerdict {
    pub can_proceed: bool,
    #[serde(default)]
    pub message: String,
    /// 0 when the join was refused.
    #[serde(default)]
    pub player_id: u64,
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ping {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pong {
    /// The `sent_at` of the ping being answered.
    pub received_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentRequest {}

/// Static scene descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentPackage {
    pub asset_keys: BTreeMap<String, String>,
    pub main: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNode {
    pub node: Node,
    #[serde(default)]
    pub player_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisteredNode {
    pub node_id: u64,
}

/// Client -> server position change, and the broadcast relayed to every player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateNode {
    pub player_id: u64,
    pub node_id: u64,
    pub position: Point,
    pub rotation: Point,
}

message!(ConnectRequest => ConnectRequest);
message!(ConnectVerdict => ConnectVerdict);
message!(Ping => Ping);
message!(Pong => Pong);
message!(EnvironmentRequest => EnvironmentRequest);
message!(EnvironmentPackage => EnvironmentPackage);
message!(RegisterNode => RegisterNode);
message!(RegisteredNode => RegisteredNode);
message!(UpdateNode => UpdateNode);
