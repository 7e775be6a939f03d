//! Time subsystem.
//!
//! Provides the frame clock used by the render loop:
//! - `elapsed()` feeds the `u_time` uniform
//! - `tick()` is called once per presented frame and updates the FPS average

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, FPS_WINDOW};
