//! Player-owned renderable entities.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Node kind. On the wire it is the integer discriminant (head = 1, arm = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Head = 1,
    Arm = 2,
}

impl NodeType {
    pub fn from_wire(v: u64) -> Option<Self> {
        match v {
            1 => Some(NodeType::Head),
            2 => Some(NodeType::Arm),
            _ => None,
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = u64::deserialize(deserializer)?;
        NodeType::from_wire(v)
            .ok_or_else(|| de::Error::custom(format!("unknown node type: {v}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A node as registered by a client and held by the room.
///
/// `id` and `pid` are assigned by the server; whatever the client sends in
/// them at registration is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub pid: u64,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub rotation: Point,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub label: String,
}

impl Node {
    pub fn new(kind: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind,
            pid: 0,
            position: Point::default(),
            rotation: Point::default(),
            asset: String::new(),
            label: label.into(),
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = asset.into();
        self
    }
}

/// Roster entry sent in `connect_verdict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}
