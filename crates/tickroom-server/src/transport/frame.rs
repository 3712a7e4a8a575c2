//! Async frame transport.
//!
//! - `FrameReader` blocks until one whole frame is buffered.
//! - `FrameWriter` emits length line and payload as one write.
//!
//! Neither type locks; callers that share one across tasks wrap it (see `Session`).

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::frame::{encode_frame, FrameDecoder};

const READ_CHUNK: usize = 8 * 1024;

pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
    decoder: FrameDecoder,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK),
            decoder: FrameDecoder::new(max_frame_bytes),
        }
    }

    /// Read the next frame.
    ///
    /// A clean EOF between frames is `ConnectionClosed`; EOF inside a frame
    /// (header or body) is a `Framing` error.
    pub async fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = self.decoder.decode(&mut self.buf)? {
                return Ok(frame);
            }

            if self.buf.capacity() - self.buf.len() < READ_CHUNK {
                self.buf.reserve(READ_CHUNK);
            }
            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.decoder.is_mid_frame(&self.buf) {
                    return Err(RoomError::Framing(
                        "stream closed before the declared byte count".into(),
                    ));
                }
                return Err(RoomError::ConnectionClosed);
            }
        }
    }
}

pub struct FrameWriter<W> {
    inner: W,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(RoomError::ConnectionClosed);
        }
        let frame = encode_frame(payload);
        self.inner.write_all(&frame).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Shut the write side down. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.shutdown().await?;
        Ok(())
    }
}
