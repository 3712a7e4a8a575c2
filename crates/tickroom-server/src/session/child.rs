use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::envelope::{self, Header};
use tickroom_core::protocol::Message;

use crate::session::Session;

/// One inbound frame, handed to exactly one handler.
///
/// The header is decoded up front so the dispatcher can route without
/// touching the command fields. The body decodes once: a second `read`
/// fails with `EmptyPayload`.
pub struct ChildMessage {
    header: Header,
    payload: Bytes,
    consumed: AtomicBool,
    session: Arc<Session>,
}

impl fmt::Debug for ChildMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildMessage")
            .field("command", &self.header.command)
            .field("sent_at", &self.header.sent_at)
            .field("bytes", &self.payload.len())
            .field("session_id", &self.session.id())
            .finish()
    }
}

impl ChildMessage {
    pub(crate) fn new(payload: Bytes, session: Arc<Session>) -> Result<Self> {
        let header = envelope::peek_command(&payload)?;
        Ok(Self {
            header,
            payload,
            consumed: AtomicBool::new(false),
            session,
        })
    }

    pub fn command(&self) -> &str {
        &self.header.command
    }

    pub fn sent_at(&self) -> u64 {
        self.header.sent_at
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Decode the command fields as `M`.
    pub fn read<M: Message>(&self) -> Result<M> {
        if self.consumed.load(Ordering::Acquire) {
            return Err(RoomError::EmptyPayload);
        }
        let inbound = envelope::decode::<M>(&self.payload)?;
        if self
            .consumed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RoomError::EmptyPayload);
        }
        Ok(inbound.fields)
    }

    /// Like `read`, but first require the envelope to carry `M`'s command.
    /// A mismatch leaves the payload unconsumed.
    pub fn expect<M: Message>(&self) -> Result<M> {
        let expected = M::COMMAND.as_str();
        if self.command() != expected {
            return Err(RoomError::UnexpectedCommand {
                expected: expected.to_string(),
                actual: self.command().to_string(),
            });
        }
        self.read()
    }

    /// Send `msg` back on the originating session, paced like any other send.
    pub async fn reply<M: Message>(&self, msg: &M) -> Result<()> {
        self.session.send(msg).await
    }
}
