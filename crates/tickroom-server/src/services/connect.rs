use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::commands::{ConnectRequest, ConnectVerdict};
use tickroom_core::protocol::Command;

use crate::dispatch::CommandHandler;
use crate::room::Room;
use crate::session::ChildMessage;

pub const WELCOME: &str = "Welcome to the server!";
pub const REJECTED: &str = "Sorry. Connection rejected.";

pub struct ConnectHandler {
    room: Arc<Room>,
}

impl ConnectHandler {
    pub fn new(room: Arc<Room>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl CommandHandler for ConnectHandler {
    fn command(&self) -> Command {
        Command::ConnectRequest
    }

    async fn handle(&self, msg: ChildMessage) -> Result<()> {
        let req: ConnectRequest = msg.read()?;

        let verdict = match self.room.join(&req.username, msg.session()).await {
            Ok((player_id, players)) => ConnectVerdict {
                can_proceed: true,
                message: WELCOME.to_string(),
                player_id,
                players,
            },
            Err(RoomError::PlayerCantJoin) => {
                info!(username = %req.username, "join refused");
                ConnectVerdict {
                    can_proceed: false,
                    message: REJECTED.to_string(),
                    player_id: 0,
                    players: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };

        msg.reply(&verdict).await
    }
}
