//! tickroom core: transport-agnostic protocol primitives and the error surface.
//!
//! This crate defines the wire contracts shared by the room server, the
//! reference client and any tooling: length-prefixed frames, the JSON command
//! envelope, the command catalog and the payload types carried inside it. It
//! carries no runtime dependency so it can be reused outside tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! Malformed input surfaces as `RoomError` instead of crashing the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, Result, RoomError};
