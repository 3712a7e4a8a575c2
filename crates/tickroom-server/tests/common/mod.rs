#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tickroom_server::config::ServerConfig;
use tickroom_server::server::{self, RunningServer};

pub const WAIT: Duration = Duration::from_secs(5);

/// Loopback config on ephemeral ports with a fast tick.
pub fn test_config() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    cfg.server.listen = "127.0.0.1:0".into();
    cfg.server.tick_rate_hz = 200;
    cfg.assets.listen = "127.0.0.1:0".into();
    cfg
}

pub async fn start(cfg: ServerConfig) -> RunningServer {
    server::start(cfg).await.unwrap()
}

pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut).await.expect("timed out")
}

/// Fresh scratch dir under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tickroom-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
