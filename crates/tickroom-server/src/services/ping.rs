use async_trait::async_trait;

use tickroom_core::error::Result;
use tickroom_core::protocol::commands::{Ping, Pong};
use tickroom_core::protocol::Command;

use crate::dispatch::CommandHandler;
use crate::session::ChildMessage;

/// Echoes the ping's `sent_at` back as `received_at`.
#[derive(Default)]
pub struct PingHandler;

impl PingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler for PingHandler {
    fn command(&self) -> Command {
        Command::Ping
    }

    async fn handle(&self, msg: ChildMessage) -> Result<()> {
        msg.read::<Ping>()?;
        let pong = Pong {
            received_at: msg.sent_at(),
        };
        msg.reply(&pong).await
    }
}
