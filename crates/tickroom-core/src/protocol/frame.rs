//! Length-prefixed framing (panic-free).
//!
//! Wire format: ASCII decimal length, `\n`, then exactly that many bytes.
//! The decoder is sans-IO: callers append whatever the socket produced to a
//! `BytesMut` and ask for the next complete frame.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, RoomError};

/// Longest accepted length line, newline excluded (u64::MAX has 20 digits).
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Encode one frame: length line followed by the payload, in a single buffer
/// so the transport can write it with one call.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let header = format!("{}\n", payload.len());
    let mut buf = BytesMut::with_capacity(header.len() + payload.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(payload);
    buf.freeze()
}

/// Parse the decimal length line (newline already stripped).
///
/// Surrounding ASCII whitespace is tolerated (`\r\n` peers); signs, blanks
/// and anything non-numeric are rejected.
pub fn parse_length_line(line: &[u8]) -> Result<usize> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Err(RoomError::Framing("empty length line".into()));
    }
    if trimmed.len() > MAX_LENGTH_DIGITS || !trimmed.iter().all(u8::is_ascii_digit) {
        return Err(RoomError::Framing(format!(
            "malformed length line: {:?}",
            String::from_utf8_lossy(trimmed)
        )));
    }
    // all digits, so only overflow can fail here
    std::str::from_utf8(trimmed)
        .map_err(|e| RoomError::Framing(format!("length line not ascii: {e}")))?
        .parse::<usize>()
        .map_err(|e| RoomError::Framing(format!("length out of range: {e}")))
}

/// Incremental frame decoder.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    max_frame_bytes: usize,
    /// Declared length of the frame whose header was already consumed.
    pending: Option<usize>,
}

impl FrameDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            pending: None,
        }
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Pull the next complete frame out of `buf`.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Once an error is
    /// returned the stream is desynchronized and must be dropped.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>> {
        let len = match self.pending {
            Some(len) => len,
            None => {
                let Some(pos) = buf.iter().position(|b| *b == b'\n') else {
                    // Allow for a trailing '\r' and some padding before giving up.
                    if buf.len() > MAX_LENGTH_DIGITS + 2 {
                        return Err(RoomError::Framing("length line too long".into()));
                    }
                    return Ok(None);
                };
                let line = buf.split_to(pos + 1);
                let len = parse_length_line(&line[..pos])?;
                if len > self.max_frame_bytes {
                    tracing::debug!(limit = self.max_frame_bytes, declared = len, "frame over limit");
                    return Err(RoomError::FrameTooLarge {
                        limit: self.max_frame_bytes,
                        actual: len,
                    });
                }
                self.pending = Some(len);
                len
            }
        };

        if buf.len() < len {
            buf.reserve(len - buf.len());
            return Ok(None);
        }

        self.pending = None;
        Ok(Some(buf.split_to(len).freeze()))
    }

    /// True if a frame was started but not finished.
    pub fn is_mid_frame(&self, buf: &BytesMut) -> bool {
        self.pending.is_some() || !buf.is_empty()
    }
}
