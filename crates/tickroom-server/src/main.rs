//! tickroom server binary.
//!
//! Loads the YAML config (or defaults), applies CLI overrides, starts the
//! room and asset listeners and waits for a shutdown signal.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tickroom_server::config::{self, ServerConfig};
use tickroom_server::server;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// YAML config file. Built-in defaults are used when absent.
    #[clap(short, long)]
    config: Option<String>,
    /// Room listen address, e.g. 0.0.0.0:3000
    #[clap(long)]
    address: Option<String>,
    /// Directory the asset server reads from
    #[clap(long)]
    assets: Option<String>,
    /// Asset server listen address
    #[clap(long = "assets-addr")]
    assets_addr: Option<String>,
    /// Server display name
    #[clap(long)]
    name: Option<String>,
    /// Short server description
    #[clap(long)]
    description: Option<String>,
    /// Ticks per second
    #[clap(long)]
    tick_rate: Option<u32>,
}

impl Args {
    fn apply(self, cfg: &mut ServerConfig) {
        if let Some(v) = self.address {
            cfg.server.listen = v;
        }
        if let Some(v) = self.assets {
            cfg.assets.dir = v;
        }
        if let Some(v) = self.assets_addr {
            cfg.assets.listen = v;
        }
        if let Some(v) = self.name {
            cfg.server.name = v;
        }
        if let Some(v) = self.description {
            cfg.server.description = v;
        }
        if let Some(v) = self.tick_rate {
            cfg.server.tick_rate_hz = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => config::load_from_file(path)?,
        None => ServerConfig::default(),
    };
    args.apply(&mut cfg);
    cfg.validate()?;

    let running = server::start(cfg).await?;
    info!(room = %running.room_addr(), assets = %running.assets_addr(), "tickroom-server started");

    shutdown_signal().await;
    info!("shutdown signal received, exiting");
    drop(running);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
