//! GPU rendering subsystem.
//!
//! The render loop talks to the graphics API only through [`RenderBackend`].
//! [`WgpuBackend`] is the real implementation; tests substitute a recorder.
//!
//! Convention:
//! - the quad is given directly in NDC, [-1, 1] on both axes
//! - shaders derive pixel coordinates from `@builtin(position)` and `u_resolution`

mod backend;
mod quad;
mod wgpu_backend;

pub use backend::{DrawStatus, RenderBackend};
pub use quad::{QuadMesh, QuadVertex, QUAD_VERTICES};
pub use wgpu_backend::WgpuBackend;
