//! Transport layer: framed async streams and the room accept loop.

pub mod frame;
pub mod listener;

pub use frame::{FrameReader, FrameWriter};
