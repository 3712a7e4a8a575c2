//! Per-connection exchange point.
//!
//! A `Session` wraps one stream and serves it in two modes: caller driven
//! (`expect_and_read`, used by the client) and dispatch driven (`run_read_loop`,
//! used by the server). Outbound sends are optionally paced onto the room tick.

mod child;
mod pacer;
#[allow(clippy::module_inception)]
mod session;

pub use child::ChildMessage;
pub use pacer::{Pacer, Turn};
pub use session::{Pacing, Session};

#[cfg(test)]
pub(crate) use session::test_support;
