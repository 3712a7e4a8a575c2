//! Asset server: a separate listener that hands out raw files by key.
//!
//! Each request is one frame holding a UTF-8 key; each response is one frame
//! holding the file bytes. Unknown or unsafe keys close the connection.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn, Instrument};

use tickroom_core::error::{Result, RoomError};

use crate::transport::{FrameReader, FrameWriter};

const MAX_KEY_BYTES: usize = 4096;

pub struct AssetStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map `key` to a path under the asset dir. Only plain relative
    /// components are accepted.
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let plain = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !plain {
            return Err(RoomError::AssetNotFound(key.to_string()));
        }
        Ok(self.dir.join(rel))
    }

    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.resolve(key)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|_| RoomError::AssetNotFound(key.to_string()))?;
        if !meta.is_file() {
            return Err(RoomError::AssetNotFound(key.to_string()));
        }
        if meta.len() > self.max_bytes as u64 {
            return Err(RoomError::FrameTooLarge {
                limit: self.max_bytes,
                actual: meta.len() as usize,
            });
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|_| RoomError::AssetNotFound(key.to_string()))?;
        Ok(Bytes::from(data))
    }
}

/// Accept asset connections until the listener fails.
pub async fn serve(listener: TcpListener, store: Arc<AssetStore>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "asset accept failed");
                continue;
            }
        };

        let store = Arc::clone(&store);
        let span = tracing::info_span!("asset_conn", %peer);
        tokio::spawn(
            async move {
                if let Err(e) = serve_conn(stream, peer, &store).await {
                    match e {
                        RoomError::ConnectionClosed => debug!("asset client left"),
                        e => info!(error = %e, code = e.code().as_str(), "asset connection closed"),
                    }
                }
            }
            .instrument(span),
        );
    }
}

async fn serve_conn(stream: TcpStream, peer: SocketAddr, store: &AssetStore) -> Result<()> {
    let _ = stream.set_nodelay(true);
    let (r, w) = stream.into_split();
    let mut reader = FrameReader::new(r, MAX_KEY_BYTES);
    let mut writer = FrameWriter::new(w);

    let res = serve_requests(&mut reader, &mut writer, peer, store).await;
    let _ = writer.close().await;
    res
}

async fn serve_requests(
    reader: &mut FrameReader<OwnedReadHalf>,
    writer: &mut FrameWriter<OwnedWriteHalf>,
    peer: SocketAddr,
    store: &AssetStore,
) -> Result<()> {
    loop {
        let frame = reader.read_frame().await?;
        let key = std::str::from_utf8(&frame)
            .map_err(|_| RoomError::AssetNotFound(String::from_utf8_lossy(&frame).into_owned()))?;
        let data = store.get(key).await?;
        debug!(%peer, key, bytes = data.len(), "asset sent");
        writer.write_frame(&data).await?;
    }
}
