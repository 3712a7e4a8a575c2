//! tickroom server library.
//!
//! Wires the frame transport, sessions, dispatcher, room and asset server
//! into one runtime. Consumed by the binaries and the integration tests.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod app_state;
pub mod assets;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod room;
pub mod server;
pub mod services;
pub mod session;
pub mod transport;
