use anyhow::Result;

use crate::render::QuadMesh;
use crate::shader::ShaderProgram;

/// Result of a draw request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawStatus {
    /// The frame was drawn and presented.
    Presented,
    /// The surface was not ready (lost, outdated, timed out, or resources
    /// already released); nothing was drawn this frame.
    Skipped,
}

/// Graphics API operations needed by the render loop.
///
/// A backend owns every GPU object it creates. `release` drops all of them
/// and must tolerate being called more than once.
pub trait RenderBackend {
    /// Builds the pipeline and uniform bindings for `program`.
    fn create_program(&mut self, program: &ShaderProgram) -> Result<()>;

    /// Uploads the quad vertex buffer.
    fn upload_quad(&mut self, mesh: &QuadMesh) -> Result<()>;

    /// Writes a uniform value to the buffer bound at `binding`.
    fn write_uniform(&mut self, binding: u32, bytes: &[u8]);

    /// Clears the target, draws `vertex_count` vertices and presents.
    ///
    /// Errors are fatal; recoverable surface problems return `Skipped`.
    fn draw(&mut self, vertex_count: u32) -> Result<DrawStatus>;

    fn set_title(&mut self, title: &str);

    fn release(&mut self);
}
