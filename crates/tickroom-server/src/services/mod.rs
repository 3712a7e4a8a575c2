//! Built-in command handlers.

pub mod connect;
pub mod environment;
pub mod nodes;
pub mod ping;

use std::sync::Arc;

use tickroom_core::error::{Result, RoomError};

use crate::dispatch::CommandHandler;
use crate::room::Room;
use crate::session::ChildMessage;

pub use connect::ConnectHandler;
pub use environment::EnvironmentHandler;
pub use nodes::{RegisterNodeHandler, UpdateNodeHandler};
pub use ping::PingHandler;

/// Every built-in handler, bound to `room`.
pub fn handlers(room: &Arc<Room>) -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(ConnectHandler::new(Arc::clone(room))),
        Arc::new(PingHandler::new()),
        Arc::new(EnvironmentHandler::new(Arc::clone(room))),
        Arc::new(RegisterNodeHandler::new(Arc::clone(room))),
        Arc::new(UpdateNodeHandler::new(Arc::clone(room))),
    ]
}

/// The player bound to the sending session, which must match `claimed`.
pub(crate) fn bound_player(msg: &ChildMessage, claimed: u64) -> Result<u64> {
    match msg.session().player_id() {
        Some(id) if id == claimed => Ok(id),
        _ => Err(RoomError::PlayerDoesntExist(claimed)),
    }
}
