use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use crate::input::InputEvent;
use crate::render::{DrawStatus, QuadMesh, RenderBackend};
use crate::shader::{
    CompileError, ShaderLoadError, ShaderProgram, ShaderSources, UniformError, UniformStatus,
    UniformType, UniformValue,
};
use crate::time::FrameClock;

/// Uniform receiving the window size in pixels, set once at startup.
pub const U_RESOLUTION: &str = "u_resolution";

/// Uniform receiving the elapsed seconds, updated every frame.
pub const U_TIME: &str = "u_time";

/// Render loop configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Requested window size in physical pixels.
    pub window_size: (u32, u32),

    /// Directory holding `vertex.wgsl` and `fragment.wgsl`.
    pub shader_dir: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_size: (2560, 1440),
            shader_dir: PathBuf::from("shaders"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Alive,
    /// Terminal. GPU resources are released and no frame renders again.
    Terminated,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    ShaderLoad(#[from] ShaderLoadError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Owns the context, the shader program, the quad and the frame clock.
///
/// Each frame: poll input, update `u_time`, clear + draw, present, tick the
/// clock and put the FPS in the window title.
pub struct RenderLoop<B: RenderBackend> {
    backend: B,
    program: ShaderProgram,
    mesh: QuadMesh,
    clock: FrameClock,
    state: LoopState,
}

impl<B: RenderBackend> RenderLoop<B> {
    /// Loads and compiles the shaders, uploads the quad and sets `u_resolution`.
    ///
    /// Shader files are read before any GPU resource is created.
    pub fn initialize(mut backend: B, config: &LoopConfig) -> Result<Self, InitError> {
        let sources = ShaderSources::load(&config.shader_dir)?;

        let program = ShaderProgram::compile(&sources)?;
        program.expect_uniform_type(U_RESOLUTION, UniformType::Vec2)?;
        program.expect_uniform_type(U_TIME, UniformType::Float)?;

        let mesh = QuadMesh;
        let uploaded = backend
            .create_program(&program)
            .and_then(|()| backend.upload_quad(&mesh));
        if let Err(e) = uploaded {
            backend.release();
            return Err(e.into());
        }

        let mut this = Self {
            backend,
            program,
            mesh,
            clock: FrameClock::new(),
            state: LoopState::Alive,
        };

        let (width, height) = config.window_size;
        this.set_builtin(U_RESOLUTION, [width as f32, height as f32]);
        this.flush_uniforms();

        log::info!("render loop ready at {width}x{height}");
        Ok(this)
    }

    /// Processes the events queued since the previous frame.
    ///
    /// A quit request or escape key-down releases the GPU resources and
    /// terminates the loop.
    pub fn poll_events(&mut self, events: &[InputEvent]) -> LoopState {
        if self.state == LoopState::Alive && events.iter().any(InputEvent::is_exit_request) {
            log::info!("exit requested");
            self.destroy();
        }
        self.state
    }

    /// Runs one frame. Returns the loop state after the frame.
    ///
    /// Nothing is drawn once the loop is terminated. Errors are fatal
    /// surface failures.
    pub fn run_frame(&mut self, events: &[InputEvent]) -> Result<LoopState> {
        if self.poll_events(events) == LoopState::Terminated {
            return Ok(LoopState::Terminated);
        }

        let elapsed = self.clock.elapsed();
        self.set_builtin(U_TIME, elapsed);
        self.flush_uniforms();

        let status = self.backend.draw(self.mesh.vertex_count())?;

        let ft = self.clock.tick();
        if status == DrawStatus::Skipped {
            log::trace!("frame {} skipped (dt {:.4}s)", ft.frame_index, ft.dt);
        }
        self.backend.set_title(&format_fps(self.clock.fps()));

        Ok(self.state)
    }

    /// Sets a uniform by name.
    ///
    /// A name the program does not declare is ignored (`UniformStatus::Ignored`).
    pub fn set_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<UniformStatus, UniformError> {
        self.program.set_uniform(name, value.into())
    }

    /// Last value stored for `name`, if the program declares it.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.program.uniform(name).map(|slot| slot.value())
    }

    /// Releases the GPU resources and terminates the loop.
    ///
    /// Calling it again does nothing.
    pub fn destroy(&mut self) {
        if self.state == LoopState::Terminated {
            return;
        }
        self.backend.release();
        self.state = LoopState::Terminated;
        log::info!("render loop terminated");
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == LoopState::Alive
    }

    /// Average frames per second over the last few frames.
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// Stores a value whose type was checked at initialization.
    fn set_builtin(&mut self, name: &str, value: impl Into<UniformValue>) {
        if let Err(e) = self.program.set_uniform(name, value.into()) {
            log::warn!("{e}");
        }
    }

    fn flush_uniforms(&mut self) {
        let backend = &mut self.backend;
        self.program
            .flush_dirty(|binding, bytes| backend.write_uniform(binding, bytes));
    }
}

impl<B: RenderBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<B: RenderBackend> fmt::Display for RenderLoop<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            LoopState::Alive => "alive",
            LoopState::Terminated => "terminated",
        };
        write!(
            f,
            "<RenderLoop:{state} program={}/{}>",
            self.program.vertex().entry_point(),
            self.program.fragment().entry_point()
        )
    }
}

/// Window title text for `fps`.
pub fn format_fps(fps: f32) -> String {
    format!("{fps:.1}")
}
