//! Shader loading, compilation and uniform reflection.
//!
//! Shaders are WGSL. A uniform is a module-scope `var<uniform>` in bind
//! group 0; its variable name is the uniform name used by
//! [`ShaderProgram::set_uniform`]:
//!
//! ```wgsl
//! @group(0) @binding(0) var<uniform> u_resolution: vec2<f32>;
//! @group(0) @binding(1) var<uniform> u_time: f32;
//! ```

mod program;
mod source;
mod uniform;

pub use program::{CompileError, ShaderProgram, Stage, StageSource};
pub use source::{ShaderLoadError, ShaderSources, FRAGMENT_FILE, VERTEX_FILE};
pub use uniform::{UniformError, UniformSlot, UniformStatus, UniformType, UniformValue};
