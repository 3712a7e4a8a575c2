use std::collections::BTreeMap;
use std::sync::Arc;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::{Node, PlayerSummary, Point};

use crate::session::Session;

/// A joined participant and the nodes it owns.
pub struct Player {
    id: u64,
    username: String,
    nodes: BTreeMap<u64, Node>,
    node_count: u64,
    session: Arc<Session>,
}

impl Player {
    pub fn new(id: u64, username: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            id,
            username: username.into(),
            nodes: BTreeMap::new(),
            node_count: 0,
            session,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_alive(&self) -> bool {
        self.session.is_alive()
    }

    pub fn node(&self, node_id: u64) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Store `node` under the next sequential id and return that id.
    ///
    /// Client supplied `id`/`pid` are overwritten. A collision fails without
    /// advancing the counter.
    pub fn register_node(&mut self, mut node: Node) -> Result<u64> {
        let node_id = self.node_count + 1;
        if self.nodes.contains_key(&node_id) {
            return Err(RoomError::NodeAlreadyExists {
                player_id: self.id,
                node_id,
            });
        }

        node.id = node_id;
        node.pid = self.id;
        self.nodes.insert(node_id, node);
        self.node_count = node_id;
        Ok(node_id)
    }

    /// Overwrite position and rotation of one node.
    pub fn update_node(&mut self, node_id: u64, position: Point, rotation: Point) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(RoomError::NodeDoesntExist {
                player_id: self.id,
                node_id,
            })?;
        node.position = position;
        node.rotation = rotation;
        Ok(())
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            username: self.username.clone(),
            nodes: self.nodes.values().cloned().collect(),
        }
    }
}
