//! Protocol modules.
//!
//! - `frame`: `<decimal-length>\n<payload>` framing, sans-IO over `bytes`.
//! - `envelope`: the JSON `{command, sent_at, ...fields}` document inside a frame.
//! - `commands`: the command catalog and its typed payloads.
//! - `node`: player-owned entities carried by the node commands.
//!
//! All parsers are panic-free: malformed input is reported as `RoomError`.

pub mod commands;
pub mod envelope;
pub mod frame;
pub mod node;

pub use commands::{Command, Message};
pub use envelope::{Header, Inbound};
pub use frame::FrameDecoder;
pub use node::{Node, NodeType, PlayerSummary, Point};
