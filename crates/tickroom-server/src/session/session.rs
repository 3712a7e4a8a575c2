use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::{envelope, Message};

use crate::dispatch::Dispatcher;
use crate::session::child::ChildMessage;
use crate::session::pacer::Pacer;
use crate::transport::{FrameReader, FrameWriter};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// How outbound sends are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sends wait for the owner's next `done()`.
    Ticked,
    /// Sends go out as soon as the write lock is free.
    Immediate,
}

pub struct Session {
    id: u64,
    peer: String,
    reader: Mutex<FrameReader<BoxedReader>>,
    writer: Mutex<FrameWriter<BoxedWriter>>,
    pacer: Option<Pacer>,
    write_timeout: Option<Duration>,
    alive: watch::Sender<bool>,
    player_id: OnceLock<u64>,
}

impl Session {
    pub fn new<S>(
        id: u64,
        peer: impl Into<String>,
        stream: S,
        max_frame_bytes: usize,
        pacing: Pacing,
        write_timeout: Option<Duration>,
    ) -> Arc<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (r, w): (ReadHalf<S>, WriteHalf<S>) = tokio::io::split(stream);
        let reader: BoxedReader = Box::new(r);
        let writer: BoxedWriter = Box::new(w);

        Arc::new(Self {
            id,
            peer: peer.into(),
            reader: Mutex::new(FrameReader::new(reader, max_frame_bytes)),
            writer: Mutex::new(FrameWriter::new(writer)),
            pacer: match pacing {
                Pacing::Ticked => Some(Pacer::new()),
                Pacing::Immediate => None,
            },
            write_timeout,
            alive: watch::channel(true).0,
            player_id: OnceLock::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Flag the session dead, fail any send still waiting for a tick and
    /// interrupt a pending `read`.
    pub fn mark_dead(&self) {
        self.alive.send_if_modified(|alive| std::mem::replace(alive, false));
        if let Some(p) = &self.pacer {
            p.close();
        }
    }

    /// Player bound to this session by a successful join.
    pub fn player_id(&self) -> Option<u64> {
        self.player_id.get().copied()
    }

    /// Bind the session to a player. Returns false if it was already bound.
    pub fn bind_player(&self, player_id: u64) -> bool {
        self.player_id.set(player_id).is_ok()
    }

    /// Release sends parked since the previous call.
    pub fn done(&self) {
        if let Some(p) = &self.pacer {
            p.release();
        }
    }

    /// Sends parked waiting for `done()`.
    pub fn pending_sends(&self) -> u64 {
        self.pacer.as_ref().map(Pacer::waiting).unwrap_or(0)
    }

    pub async fn send<M: Message>(&self, msg: &M) -> Result<()> {
        self.send_as(M::COMMAND.as_str(), msg).await
    }

    /// Send `fields` under an arbitrary command name.
    ///
    /// `sent_at` is stamped after the pacing wait, right before the write.
    pub async fn send_as<T>(&self, command: &str, fields: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let _turn = match &self.pacer {
            Some(p) => Some(p.acquire().await?),
            None => None,
        };
        let payload = envelope::encode(command, fields)?;
        self.write_frame(&payload).await
    }

    async fn write_frame(&self, payload: &[u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(RoomError::ConnectionClosed);
        }
        let mut w = self.writer.lock().await;
        let res = match self.write_timeout {
            Some(limit) => match tokio::time::timeout(limit, w.write_frame(payload)).await {
                Ok(res) => res,
                Err(_) => Err(RoomError::Io(format!(
                    "write stalled for {}ms",
                    limit.as_millis()
                ))),
            },
            None => w.write_frame(payload).await,
        };
        if res.is_err() {
            self.mark_dead();
        }
        res
    }

    /// Read one inbound frame and wrap it as a child message.
    ///
    /// Fails with `ConnectionClosed` as soon as the session is marked dead,
    /// even while blocked on the socket.
    pub async fn read(self: &Arc<Self>) -> Result<ChildMessage> {
        let mut alive = self.alive.subscribe();
        let mut reader = self.reader.lock().await;
        let frame = tokio::select! {
            res = reader.read_frame() => res?,
            _ = async { let _ = alive.wait_for(|a| !*a).await; } => {
                return Err(RoomError::ConnectionClosed);
            }
        };
        drop(reader);
        ChildMessage::new(frame, Arc::clone(self))
    }

    /// Read exactly one frame and require it to carry `M`'s command.
    ///
    /// A mismatch consumes the frame but leaves the stream usable.
    pub async fn expect_and_read<M: Message>(self: &Arc<Self>) -> Result<M> {
        self.read().await?.expect()
    }

    /// Server-side read task: dispatch every inbound frame until the stream
    /// fails, then mark the session dead.
    ///
    /// Handlers run inline, so a handler waiting on a paced send holds back
    /// further reads from this connection until the next tick.
    pub async fn run_read_loop(self: Arc<Self>, dispatcher: Arc<Dispatcher>) {
        loop {
            let msg = match self.read().await {
                Ok(msg) => msg,
                Err(RoomError::ConnectionClosed) => {
                    info!("peer closed connection");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, code = e.code().as_str(), "read failed, closing session");
                    break;
                }
            };

            let command = msg.command().to_string();
            match dispatcher.dispatch(msg).await {
                Ok(()) => debug!(%command, "handled"),
                Err(e) if e.is_connection_fatal() => {
                    warn!(%command, error = %e, "connection failed in handler, closing session");
                    break;
                }
                Err(e) => {
                    info!(%command, error = %e, code = e.code().as_str(), "command dropped");
                }
            }
        }

        self.close().await;
    }

    /// Mark dead and shut the write side. Idempotent.
    pub async fn close(&self) {
        self.mark_dead();
        if let Err(e) = self.writer.lock().await.close().await {
            debug!(session_id = self.id, error = %e, "shutdown after close");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tokio::io::DuplexStream;

    use super::{Pacing, Session};
    use crate::transport::{FrameReader, FrameWriter};

    /// A session over an in-memory pipe plus the peer's framed ends.
    pub(crate) fn session_pair(
        id: u64,
        pacing: Pacing,
    ) -> (
        Arc<Session>,
        FrameReader<tokio::io::ReadHalf<DuplexStream>>,
        FrameWriter<tokio::io::WriteHalf<DuplexStream>>,
    ) {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        let session = Session::new(id, format!("test-{id}"), ours, 64 * 1024, pacing, None);
        let (r, w) = tokio::io::split(theirs);
        (session, FrameReader::new(r, 64 * 1024), FrameWriter::new(w))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use tokio::time::timeout;

    use tickroom_core::protocol::commands::{Ping, Pong};
    use tickroom_core::protocol::envelope::{decode, encode_message};

    use super::test_support::session_pair;
    use super::*;

    #[tokio::test]
    async fn ticked_send_waits_for_done() {
        let (session, mut peer_r, _peer_w) = session_pair(1, Pacing::Ticked);

        let s2 = Arc::clone(&session);
        let h = tokio::spawn(async move { s2.send(&Pong { received_at: 5 }).await });

        while session.pending_sends() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(timeout(Duration::from_millis(30), peer_r.read_frame()).await.is_err());

        session.done();
        let frame = timeout(Duration::from_secs(2), peer_r.read_frame())
            .await
            .unwrap()
            .unwrap();
        let pong = decode::<Pong>(&frame).unwrap();
        assert_eq!(pong.command, "pong");
        assert_eq!(pong.fields.received_at, 5);
        h.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn expect_and_read_rejects_other_commands_but_stays_usable() {
        let (session, _peer_r, mut peer_w) = session_pair(2, Pacing::Immediate);

        peer_w.write_frame(&encode_message(&Ping {}).unwrap()).await.unwrap();
        peer_w
            .write_frame(&encode_message(&Pong { received_at: 9 }).unwrap())
            .await
            .unwrap();

        let err = session.expect_and_read::<Pong>().await.unwrap_err();
        assert_eq!(err.code().as_str(), "UNEXPECTED_COMMAND");

        let pong = session.expect_and_read::<Pong>().await.unwrap();
        assert_eq!(pong.received_at, 9);
    }

    #[tokio::test]
    async fn dead_session_fails_parked_sends() {
        let (session, _peer_r, _peer_w) = session_pair(3, Pacing::Ticked);
        let s2 = Arc::clone(&session);
        let h = tokio::spawn(async move { s2.send(&Ping {}).await });
        while session.pending_sends() == 0 {
            tokio::task::yield_now().await;
        }

        session.mark_dead();
        let err = timeout(Duration::from_secs(2), h).await.unwrap().unwrap().unwrap_err();
        assert_eq!(err.code().as_str(), "CONNECTION_CLOSED");
        assert!(!session.is_alive());
    }

    #[tokio::test]
    async fn stalled_peer_fails_the_write_and_kills_the_session() {
        // The peer end stays open but is never read from.
        let (ours, _theirs) = tokio::io::duplex(32);
        let session = Session::new(
            5,
            "stalled",
            ours,
            64 * 1024,
            Pacing::Immediate,
            Some(Duration::from_millis(50)),
        );

        let err = timeout(Duration::from_secs(2), session.send(&Pong { received_at: 1 }))
            .await
            .unwrap()
            .unwrap_err();
        assert!(err.is_connection_fatal());
        assert!(!session.is_alive());

        // Close must not hang behind the abandoned write.
        timeout(Duration::from_secs(2), session.close()).await.unwrap();
    }

    #[tokio::test]
    async fn mark_dead_interrupts_a_blocked_read() {
        let (session, _peer_r, _peer_w) = session_pair(6, Pacing::Immediate);
        let s2 = Arc::clone(&session);
        let h = tokio::spawn(async move { s2.read().await.map(|m| m.command().to_string()) });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!h.is_finished());

        session.mark_dead();
        let err = timeout(Duration::from_secs(2), h).await.unwrap().unwrap().unwrap_err();
        assert_eq!(err.code().as_str(), "CONNECTION_CLOSED");
    }

    #[tokio::test]
    async fn player_binding_is_one_shot() {
        let (session, _r, _w) = session_pair(4, Pacing::Immediate);
        assert_eq!(session.player_id(), None);
        assert!(session.bind_player(7));
        assert!(!session.bind_player(8));
        assert_eq!(session.player_id(), Some(7));
    }
}
