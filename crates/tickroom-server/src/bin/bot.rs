//! tickroom bot: joins a room, registers a head and two arms, then sways
//! them back and forth forever.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tickroom_core::protocol::{Node, NodeType, Point};
use tickroom_server::client::Client;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Room server address
    #[clap(long, default_value = "127.0.0.1:3000")]
    address: String,
    /// Asset server address
    #[clap(long = "assets-address", default_value = "127.0.0.1:3001")]
    assets_address: String,
    /// Username to join with
    #[clap(long, default_value = "reverb")]
    username: String,
    /// Position updates per second
    #[clap(long, default_value = "10")]
    rate: u32,
}

const STEP: f64 = std::f64::consts::PI / 180.0 * 5.0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut client = Client::new(&args.address, &args.username).with_assets(&args.assets_address);
    let verdict = client.connect().await?;
    info!(player_id = verdict.player_id, players = verdict.players.len(), message = %verdict.message, "connected");

    let env = client.environment().await?;
    match env.asset_keys.get(&env.main) {
        Some(key) => match client.asset(key).await {
            Ok(data) => info!(key = %key, bytes = data.len(), "fetched main asset"),
            Err(e) => warn!(key = %key, error = %e, "main asset unavailable"),
        },
        None => warn!(main = %env.main, "environment names no main asset"),
    }

    let mut nodes = vec![
        Node::new(NodeType::Head, "Your head, bro!")
            .with_asset("box")
            .at(Point::new(0.0, 2.0, 0.0)),
        Node::new(NodeType::Arm, "This is your arm, sis!")
            .with_asset("box")
            .at(Point::new(-1.0, 1.0, 0.0)),
        Node::new(NodeType::Arm, "This is your arm, you!")
            .with_asset("box")
            .at(Point::new(1.0, 1.0, 0.0)),
    ];
    for node in &mut nodes {
        node.id = client.register_node(node.clone()).await?;
        info!(node_id = node.id, label = %node.label, "registered");
    }

    let client = Arc::new(client);
    let drain = Arc::clone(&client);
    tokio::spawn(async move {
        // Relays come back to us too; keep the update queue empty.
        while drain.next_update().await.is_ok() {}
    });

    let mut ticker = interval(Duration::from_secs_f64(1.0 / args.rate.max(1) as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut phase = 0.0_f64;
    loop {
        ticker.tick().await;
        for node in &mut nodes {
            node.position.z = phase.sin();
            client
                .update_node(node.id, node.position, node.rotation)
                .await?;
        }
        phase += STEP;
    }
}
