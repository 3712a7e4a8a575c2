//! Process bootstrap: one room listener plus one asset listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use tickroom_core::error::Result;

use crate::app_state::AppState;
use crate::assets::{self, AssetStore};
use crate::config::ServerConfig;
use crate::room::Room;
use crate::transport::listener;

/// Handle to a started server. Dropping it stops both accept loops.
pub struct RunningServer {
    room_addr: SocketAddr,
    assets_addr: SocketAddr,
    state: AppState,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningServer {
    pub fn room_addr(&self) -> SocketAddr {
        self.room_addr
    }

    pub fn assets_addr(&self) -> SocketAddr {
        self.assets_addr
    }

    pub fn room(&self) -> Arc<Room> {
        self.state.room()
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        for t in &self.tasks {
            t.abort();
        }
    }
}

/// Bind both listeners and spawn their accept loops.
pub async fn start(cfg: ServerConfig) -> Result<RunningServer> {
    let room_listener = TcpListener::bind(cfg.server.listen.as_str()).await?;
    let assets_listener = TcpListener::bind(cfg.assets.listen.as_str()).await?;
    let room_addr = room_listener.local_addr()?;
    let assets_addr = assets_listener.local_addr()?;

    let store = Arc::new(AssetStore::new(&cfg.assets.dir, cfg.assets.max_asset_bytes));
    let state = AppState::new(cfg)?;
    let room = state.room();

    info!(
        name = room.name(),
        description = room.description(),
        %room_addr,
        %assets_addr,
        assets_dir = %store.dir().display(),
        "tickroom server listening"
    );

    let tasks = vec![
        tokio::spawn(listener::serve(room_listener, state.clone())),
        tokio::spawn(assets::serve(assets_listener, store)),
    ];

    Ok(RunningServer {
        room_addr,
        assets_addr,
        state,
        tasks,
    })
}
