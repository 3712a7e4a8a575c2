use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::Command;

use crate::session::ChildMessage;

/// A handler for one wire command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn command(&self) -> Command;
    async fn handle(&self, msg: ChildMessage) -> Result<()>;
}

/// Command to handler table, fixed at construction.
pub struct Dispatcher {
    handlers: HashMap<Command, Arc<dyn CommandHandler>>,
}

impl Dispatcher {
    /// Build the table. A later handler for the same command wins, with a
    /// warning.
    pub fn new(handlers: impl IntoIterator<Item = Arc<dyn CommandHandler>>) -> Self {
        let mut table: HashMap<Command, Arc<dyn CommandHandler>> = HashMap::new();
        for h in handlers {
            let command = h.command();
            if table.insert(command, h).is_some() {
                warn!(%command, "handler replaced");
            }
        }
        Self { handlers: table }
    }

    pub fn registered(&self) -> Vec<Command> {
        let mut out: Vec<Command> = self.handlers.keys().copied().collect();
        out.sort_by_key(|c| c.as_str());
        out
    }

    /// Members of `required` with no handler, in the order given.
    pub fn unrouted(&self, required: &[Command]) -> Vec<Command> {
        required
            .iter()
            .copied()
            .filter(|c| !self.handlers.contains_key(c))
            .collect()
    }

    /// Route `msg` by its command name.
    ///
    /// Unknown names and known commands with no handler both yield
    /// `HandlerNotFound`; the message is dropped.
    pub async fn dispatch(&self, msg: ChildMessage) -> Result<()> {
        let name = msg.command();
        let handler = Command::from_wire(name)
            .and_then(|c| self.handlers.get(&c).cloned())
            .ok_or_else(|| RoomError::HandlerNotFound(name.to_string()))?;
        handler.handle(msg).await
    }
}
