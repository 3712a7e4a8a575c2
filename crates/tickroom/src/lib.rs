//! Top-level facade crate for tickroom.
//!
//! Re-exports the protocol primitives and the server runtime so users can
//! depend on a single crate.

pub mod core {
    pub use tickroom_core::*;
}

pub mod server {
    pub use tickroom_server::*;
}

pub use tickroom_core::{Result, RoomError};
pub use tickroom_server::client::Client;
