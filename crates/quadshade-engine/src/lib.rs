//! quadshade engine crate.
//!
//! Opens a window, compiles a WGSL vertex/fragment pair and redraws a
//! fullscreen quad every frame, feeding `u_resolution` and `u_time` to the
//! shaders.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod shader;
pub mod time;
pub mod window;
