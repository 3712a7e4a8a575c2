//! Command envelope (JSON).
//!
//! Every typed frame carries one document of the shape
//! `{"command": "...", "sent_at": <unix millis>, ...fields}`; the command
//! specific fields sit at the same level as the header.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoomError};
use crate::protocol::commands::Message;

/// Envelope header, decoded without looking at the command fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub command: String,
    #[serde(default)]
    pub sent_at: u64,
}

/// Fully decoded inbound envelope.
#[derive(Debug, Deserialize)]
pub struct Inbound<T> {
    pub command: String,
    #[serde(default)]
    pub sent_at: u64,
    #[serde(flatten)]
    pub fields: T,
}

#[derive(Serialize)]
struct Outbound<'a, T: ?Sized> {
    command: &'a str,
    sent_at: u64,
    #[serde(flatten)]
    fields: &'a T,
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Serialize `fields` under `command`, stamping `sent_at` with the current time.
///
/// `fields` must serialize as a JSON object (struct or map).
pub fn encode<T: Serialize + ?Sized>(command: &str, fields: &T) -> Result<Bytes> {
    encode_at(command, fields, now_millis())
}

/// Like [`encode`] with an explicit timestamp.
pub fn encode_at<T: Serialize + ?Sized>(command: &str, fields: &T, sent_at: u64) -> Result<Bytes> {
    let out = Outbound {
        command,
        sent_at,
        fields,
    };
    serde_json::to_vec(&out)
        .map(Bytes::from)
        .map_err(|e| RoomError::Decode(format!("envelope encode failed ({command}): {e}")))
}

/// Serialize a typed message; the command comes from its type.
pub fn encode_message<M: Message>(msg: &M) -> Result<Bytes> {
    encode(M::COMMAND.as_str(), msg)
}

/// Decode a whole envelope into typed fields.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<Inbound<T>> {
    if payload.is_empty() {
        return Err(RoomError::EmptyPayload);
    }
    serde_json::from_slice(payload)
        .map_err(|e| RoomError::Decode(format!("invalid envelope: {e}")))
}

/// Decode only the header; unknown fields are ignored, so this works before
/// the payload type is known.
pub fn peek_command(payload: &[u8]) -> Result<Header> {
    if payload.is_empty() {
        return Err(RoomError::EmptyPayload);
    }
    serde_json::from_slice(payload)
        .map_err(|e| RoomError::Decode(format!("invalid envelope header: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::protocol::commands::{Ping, Pong};

    #[test]
    fn fields_sit_next_to_the_header() {
        let bytes = encode_at("pong", &Pong { received_at: 42 }, 7).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["command"], "pong");
        assert_eq!(v["sent_at"], 7);
        assert_eq!(v["received_at"], 42);
    }

    #[test]
    fn empty_struct_fields_encode_to_header_only() {
        let bytes = encode_at("ping", &Ping {}, 1).unwrap();
        assert_eq!(&bytes[..], br#"{"command":"ping","sent_at":1}"#);
    }

    #[test]
    fn encode_stamps_send_time() {
        let before = now_millis();
        let bytes = encode_message(&Ping {}).unwrap();
        let h = peek_command(&bytes).unwrap();
        assert_eq!(h.command, "ping");
        assert!(h.sent_at >= before);
    }

    #[test]
    fn empty_buffer_is_not_a_decode_error() {
        assert_eq!(peek_command(b"").unwrap_err().code().as_str(), "EMPTY_PAYLOAD");
        assert_eq!(
            decode::<Pong>(b"").unwrap_err().code().as_str(),
            "EMPTY_PAYLOAD"
        );
    }
}
