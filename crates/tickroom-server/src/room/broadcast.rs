use std::sync::{Arc, Weak};

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::{Command, Message};

use crate::room::Room;

/// One queued room-wide message. The fields are serialized once and shared
/// by every recipient.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub command: Command,
    pub fields: Arc<serde_json::Value>,
}

impl Broadcast {
    pub fn new<M: Message>(msg: &M) -> Result<Self> {
        let fields = serde_json::to_value(msg)
            .map_err(|e| RoomError::Internal(format!("broadcast encode failed: {e}")))?;
        Ok(Self {
            command: M::COMMAND,
            fields: Arc::new(fields),
        })
    }
}

/// Drain the broadcast queue, spawning one delivery task per entry.
pub(super) async fn run(room: Weak<Room>, mut rx: mpsc::Receiver<Broadcast>) {
    while let Some(entry) = rx.recv().await {
        let Some(strong) = room.upgrade() else { break };
        let recipients = strong.registry().await.live_sessions();
        drop(strong);

        debug!(command = %entry.command, recipients = recipients.len(), "broadcast");
        tokio::spawn(async move {
            let mut sends = FuturesUnordered::new();
            for (player_id, session) in recipients {
                let entry = entry.clone();
                sends.push(async move {
                    let res = session
                        .send_as(entry.command.as_str(), entry.fields.as_ref())
                        .await;
                    if let Err(e) = res {
                        // The next tick prunes the player.
                        session.mark_dead();
                        warn!(player_id, error = %e, "broadcast delivery failed");
                    }
                });
            }
            while sends.next().await.is_some() {}
        });
    }
}
