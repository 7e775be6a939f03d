//! The render loop.
//!
//! `RenderLoop` is the single owned aggregate holding the graphics context,
//! the shader program, the quad and the frame clock. The runtime drives it
//! once per redraw and stops when it reports `LoopState::Terminated`.

mod render_loop;

pub use render_loop::{
    format_fps, InitError, LoopConfig, LoopState, RenderLoop, U_RESOLUTION, U_TIME,
};
