//! Command routing.
//!
//! Each handler serves one wire command. The table is built once at startup
//! and never changes; the read loop hands every inbound child message to
//! `Dispatcher::dispatch`.

pub mod dispatcher;

pub use dispatcher::{CommandHandler, Dispatcher};
