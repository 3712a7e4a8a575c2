//! Room TCP accept loop.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn, Instrument};

use crate::app_state::AppState;
use crate::session::{Pacing, Session};

/// Accept connections forever. Each one gets a ticked session, a lobby slot
/// and its own read task.
pub async fn serve(listener: TcpListener, state: AppState) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%peer, error = %e, "set_nodelay failed");
        }

        let session_id = state.session_seq().fetch_add(1, Ordering::Relaxed);
        let session = Session::new(
            session_id,
            peer.to_string(),
            stream,
            state.cfg().server.max_frame_bytes,
            Pacing::Ticked,
            Some(state.cfg().server.write_timeout()),
        );

        let room = state.room();
        let dispatcher = state.dispatcher();
        let span = tracing::info_span!("session", session_id, %peer);
        tokio::spawn(
            async move {
                info!("connected");
                room.admit(Arc::clone(&session));
                session.run_read_loop(dispatcher).await;
                info!("disconnected");
            }
            .instrument(span),
        );
    }
}
