//! Reference client, used by the integration tests and the bot.
//!
//! After the join handshake a background task owns the read side. Relayed
//! `update_node` frames go to an update queue drained by `next_update`;
//! everything else is a reply and goes to whichever request is waiting.
//! Requests are serialized, so replies pair up with them in order. Sends are
//! not paced.

use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::commands::{
    ConnectRequest, ConnectVerdict, EnvironmentPackage, EnvironmentRequest, Ping, Pong,
    RegisterNode, RegisteredNode, UpdateNode,
};
use tickroom_core::protocol::{Command, Message, Node, Point};

use crate::session::{ChildMessage, Pacing, Session};
use crate::transport::{FrameReader, FrameWriter};

const CLIENT_MAX_FRAME: usize = 16 * 1024 * 1024;
const REPLY_BACKLOG: usize = 16;
const UPDATE_BACKLOG: usize = 1024;

pub struct Client {
    address: String,
    assets_address: Option<String>,
    username: String,
    conn: Option<Connection>,
    player_id: u64,
}

struct Connection {
    session: Arc<Session>,
    replies: Mutex<mpsc::Receiver<ChildMessage>>,
    updates: Mutex<mpsc::Receiver<UpdateNode>>,
    reader: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.session.mark_dead();
        self.reader.abort();
    }
}

/// Route inbound frames until the session dies.
async fn demux(
    session: Arc<Session>,
    replies: mpsc::Sender<ChildMessage>,
    updates: mpsc::Sender<UpdateNode>,
) {
    loop {
        let msg = match session.read().await {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "client read side finished");
                break;
            }
        };

        if msg.command() == Command::UpdateNode.as_str() {
            match msg.read::<UpdateNode>() {
                Ok(update) => {
                    if updates.try_send(update).is_err() {
                        debug!("update backlog full, dropping relayed update");
                    }
                }
                Err(e) => warn!(error = %e, "undecodable update_node"),
            }
        } else if replies.send(msg).await.is_err() {
            break;
        }
    }
    session.mark_dead();
}

impl Client {
    pub fn new(address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            assets_address: None,
            username: username.into(),
            conn: None,
            player_id: 0,
        }
    }

    pub fn with_assets(mut self, address: impl Into<String>) -> Self {
        self.assets_address = Some(address.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 0 until `connect` succeeds.
    pub fn player_id(&self) -> u64 {
        self.player_id
    }

    /// Dial the room and join. A negative verdict closes the connection and
    /// fails with `ClientRejected`.
    pub async fn connect(&mut self) -> Result<ConnectVerdict> {
        let stream = TcpStream::connect(self.address.as_str()).await?;
        let _ = stream.set_nodelay(true);
        let peer = stream.peer_addr()?.to_string();
        let session = Session::new(0, peer, stream, CLIENT_MAX_FRAME, Pacing::Immediate, None);

        session
            .send(&ConnectRequest {
                username: self.username.clone(),
            })
            .await?;
        // Nothing is relayed to a session before it joins, so the first
        // frame is the verdict.
        let verdict = session.expect_and_read::<ConnectVerdict>().await?;

        if !verdict.can_proceed {
            session.close().await;
            return Err(RoomError::ClientRejected(verdict.message));
        }

        let (reply_tx, reply_rx) = mpsc::channel(REPLY_BACKLOG);
        let (update_tx, update_rx) = mpsc::channel(UPDATE_BACKLOG);
        let reader = tokio::spawn(demux(Arc::clone(&session), reply_tx, update_tx));

        debug!(player_id = verdict.player_id, username = %self.username, "joined");
        self.player_id = verdict.player_id;
        self.conn = Some(Connection {
            session,
            replies: Mutex::new(reply_rx),
            updates: Mutex::new(update_rx),
            reader,
        });
        Ok(verdict)
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(RoomError::ClientNotConnected)
    }

    /// Send `req` and wait for its reply.
    async fn request<Req: Message, Resp: Message>(&self, req: &Req) -> Result<Resp> {
        let conn = self.conn()?;
        let mut replies = conn.replies.lock().await;
        conn.session.send(req).await?;
        let msg = replies.recv().await.ok_or(RoomError::ConnectionClosed)?;
        msg.expect::<Resp>()
    }

    pub async fn ping(&self) -> Result<Pong> {
        self.request(&Ping {}).await
    }

    pub async fn environment(&self) -> Result<EnvironmentPackage> {
        self.request(&EnvironmentRequest {}).await
    }

    /// Register `node` and return the id the room assigned.
    pub async fn register_node(&self, node: Node) -> Result<u64> {
        let reply: RegisteredNode = self
            .request(&RegisterNode {
                node,
                player_id: self.player_id,
            })
            .await?;
        Ok(reply.node_id)
    }

    /// Fire and forget; the change comes back as a relayed update.
    pub async fn update_node(&self, node_id: u64, position: Point, rotation: Point) -> Result<()> {
        self.conn()?
            .session
            .send(&UpdateNode {
                player_id: self.player_id,
                node_id,
                position,
                rotation,
            })
            .await
    }

    /// Wait for the next relayed `update_node`, skipping nothing: updates that
    /// arrived while a request was in flight are queued.
    pub async fn next_update(&self) -> Result<UpdateNode> {
        self.conn()?
            .updates
            .lock()
            .await
            .recv()
            .await
            .ok_or(RoomError::ConnectionClosed)
    }

    /// Fetch one asset over a fresh connection to the asset server.
    pub async fn asset(&self, key: &str) -> Result<Bytes> {
        let address = self
            .assets_address
            .as_deref()
            .ok_or(RoomError::ClientNotConnected)?;
        let stream = TcpStream::connect(address).await?;
        let (r, w) = stream.into_split();
        let mut reader = FrameReader::new(r, CLIENT_MAX_FRAME);
        let mut writer = FrameWriter::new(w);

        writer.write_frame(key.as_bytes()).await?;
        let data = match reader.read_frame().await {
            Err(RoomError::ConnectionClosed) => Err(RoomError::AssetNotFound(key.to_string())),
            other => other,
        };
        let _ = writer.close().await;
        data
    }

    pub async fn close(&self) {
        if let Some(conn) = &self.conn {
            conn.session.close().await;
        }
    }
}
