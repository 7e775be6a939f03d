//! Input subsystem.
//!
//! The render loop only reacts to quit requests and the escape key, so the
//! event model is small. Runtime code translates platform events
//! into `InputEvent`s and queues them in an `InputFrame` until the next frame.

mod frame;
mod types;

pub mod platform;

pub use frame::InputFrame;
pub use types::{InputEvent, Key, KeyState};
