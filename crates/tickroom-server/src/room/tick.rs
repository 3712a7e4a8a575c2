use std::sync::Weak;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::room::Room;

pub(super) async fn run(room: Weak<Room>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(strong) = room.upgrade() else {
            debug!("room dropped, tick loop exiting");
            break;
        };
        strong.tick().await;
    }
}
