use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use tickroom_core::error::Result;
use tickroom_core::protocol::commands::{RegisterNode, RegisteredNode, UpdateNode};
use tickroom_core::protocol::Command;

use crate::dispatch::CommandHandler;
use crate::room::Room;
use crate::services::bound_player;
use crate::session::ChildMessage;

pub struct RegisterNodeHandler {
    room: Arc<Room>,
}

impl RegisterNodeHandler {
    pub fn new(room: Arc<Room>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl CommandHandler for RegisterNodeHandler {
    fn command(&self) -> Command {
        Command::RegisterNode
    }

    async fn handle(&self, msg: ChildMessage) -> Result<()> {
        let req: RegisterNode = msg.read()?;
        let player_id = bound_player(&msg, req.player_id)?;

        let label = req.node.label.clone();
        let node_id = self
            .room
            .registry()
            .await
            .register_node(player_id, req.node)?;
        info!(player_id, node_id, %label, "node registered");

        msg.reply(&RegisteredNode { node_id }).await
    }
}

/// Applies a pose change and relays it to every player. No reply.
pub struct UpdateNodeHandler {
    room: Arc<Room>,
}

impl UpdateNodeHandler {
    pub fn new(room: Arc<Room>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl CommandHandler for UpdateNodeHandler {
    fn command(&self) -> Command {
        Command::UpdateNode
    }

    async fn handle(&self, msg: ChildMessage) -> Result<()> {
        let req: UpdateNode = msg.read()?;
        let player_id = bound_player(&msg, req.player_id)?;

        self.room
            .registry()
            .await
            .update_node(player_id, req.node_id, req.position, req.rotation)?;
        debug!(player_id, node_id = req.node_id, "node updated");

        self.room.broadcast(&req).await
    }
}
