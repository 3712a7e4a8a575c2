//! The room: player registry, lobby, tick loop and broadcast fan-out.
//!
//! All registry mutations go through one `tokio::sync::Mutex`. The lock is
//! never held across a send, since paced sends only complete once the tick
//! (which takes the same lock) releases them.

mod broadcast;
mod player;
mod registry;
mod tick;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, info};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::commands::EnvironmentPackage;
use tickroom_core::protocol::{Message, PlayerSummary};

use crate::config::ServerConfig;
use crate::session::Session;

pub use broadcast::Broadcast;
pub use player::Player;
pub use registry::Registry;

pub struct Room {
    name: String,
    description: String,
    environment: EnvironmentPackage,
    registry: Mutex<Registry>,
    lobby: DashMap<u64, Arc<Session>>,
    broadcast_tx: mpsc::Sender<Broadcast>,
}

impl Room {
    /// Build the room and spawn its tick and fan-out tasks.
    ///
    /// Both tasks hold only a weak reference and stop once the room is dropped.
    pub fn start(cfg: &ServerConfig) -> Arc<Self> {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(cfg.server.broadcast_queue);
        let room = Arc::new(Self {
            name: cfg.server.name.clone(),
            description: cfg.server.description.clone(),
            environment: cfg.environment.package(),
            registry: Mutex::new(Registry::new()),
            lobby: DashMap::new(),
            broadcast_tx,
        });

        tokio::spawn(tick::run(Arc::downgrade(&room), cfg.server.tick_interval()));
        tokio::spawn(broadcast::run(Arc::downgrade(&room), broadcast_rx));

        info!(
            name = %room.name,
            tick_rate_hz = cfg.server.tick_rate_hz,
            "room started"
        );
        room
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn environment(&self) -> &EnvironmentPackage {
        &self.environment
    }

    pub(crate) async fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().await
    }

    /// Park a fresh connection until it joins; the tick releases its sends.
    pub fn admit(&self, session: Arc<Session>) {
        debug!(session_id = session.id(), "session admitted to lobby");
        self.lobby.insert(session.id(), session);
    }

    pub fn lobby_len(&self) -> usize {
        self.lobby.len()
    }

    /// Join `session` as `username`, moving it out of the lobby.
    ///
    /// Returns the new id and the roster including the joiner.
    pub async fn join(
        &self,
        username: &str,
        session: &Arc<Session>,
    ) -> Result<(u64, Vec<PlayerSummary>)> {
        if session.player_id().is_some() {
            return Err(RoomError::PlayerCantJoin);
        }

        let mut reg = self.registry().await;
        let player_id = reg.join(username, Arc::clone(session))?;
        if !session.bind_player(player_id) {
            return Err(RoomError::Internal(format!(
                "session {} bound twice",
                session.id()
            )));
        }
        let roster = reg.roster();
        drop(reg);

        self.lobby.remove(&session.id());
        info!(player_id, username, session_id = session.id(), "player joined");
        Ok((player_id, roster))
    }

    pub async fn player_count(&self) -> usize {
        self.registry().await.len()
    }

    pub async fn roster(&self) -> Vec<PlayerSummary> {
        self.registry().await.roster()
    }

    /// Queue `msg` for delivery to every live player.
    pub async fn broadcast<M: Message>(&self, msg: &M) -> Result<()> {
        let entry = Broadcast::new(msg)?;
        self.broadcast_tx
            .send(entry)
            .await
            .map_err(|_| RoomError::Internal("broadcast queue closed".into()))
    }

    /// One sweep: prune dead players, then release paced sends on everyone
    /// still connected.
    pub async fn tick(&self) {
        let (pruned, live) = {
            let mut reg = self.registry().await;
            let pruned = reg.prune_dead();
            (pruned, reg.live_sessions())
        };

        for player in pruned {
            info!(
                player_id = player.id(),
                username = player.username(),
                "pruned dead player"
            );
            let session = Arc::clone(player.session());
            tokio::spawn(async move { session.close().await });
        }

        for (_, session) in &live {
            session.done();
        }

        self.lobby.retain(|_, s| s.is_alive());
        for entry in self.lobby.iter() {
            entry.value().done();
        }
    }
}
