//! Shared application state.
//!
//! Builds the room and the dispatcher from the built-in handlers, refuses to
//! start if a client command would go unrouted, and hands out clones to
//! connection tasks.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tracing::{debug, error};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::Command;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::room::Room;
use crate::services;

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
    room: Arc<Room>,
    dispatcher: Arc<Dispatcher>,
    session_seq: Arc<AtomicU64>,
}

impl AppState {
    /// Must be called inside a tokio runtime; starts the room's tasks.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let room = Room::start(&cfg);

        let dispatcher = Dispatcher::new(services::handlers(&room));
        debug!(commands = ?dispatcher.registered(), "handlers registered");

        // inbound catalog <-> dispatcher sanity check
        let missing = dispatcher.unrouted(&Command::INBOUND);
        if !missing.is_empty() {
            error!(?missing, "client commands without a handler");
            return Err(RoomError::Internal(format!(
                "no handler for client commands: {missing:?}"
            )));
        }

        Ok(Self {
            cfg: Arc::new(cfg),
            room,
            dispatcher: Arc::new(dispatcher),
            session_seq: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn room(&self) -> Arc<Room> {
        Arc::clone(&self.room)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub(crate) fn session_seq(&self) -> &AtomicU64 {
        &self.session_seq
    }
}
