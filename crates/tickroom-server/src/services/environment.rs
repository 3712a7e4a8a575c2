use std::sync::Arc;

use async_trait::async_trait;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::commands::EnvironmentRequest;
use tickroom_core::protocol::Command;

use crate::dispatch::CommandHandler;
use crate::room::Room;
use crate::session::ChildMessage;

pub struct EnvironmentHandler {
    room: Arc<Room>,
}

impl EnvironmentHandler {
    pub fn new(room: Arc<Room>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl CommandHandler for EnvironmentHandler {
    fn command(&self) -> Command {
        Command::EnvironmentRequest
    }

    async fn handle(&self, msg: ChildMessage) -> Result<()> {
        msg.read::<EnvironmentRequest>()?;
        if msg.session().player_id().is_none() {
            return Err(RoomError::PlayerDoesntExist(0));
        }
        msg.reply(self.room.environment()).await
    }
}
