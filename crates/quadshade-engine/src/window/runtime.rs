use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{LoopConfig, LoopState, RenderLoop};
use crate::device::{Gpu, GpuInit};
use crate::input::InputFrame;
use crate::input::platform::winit::translate_window_event;
use crate::render::WgpuBackend;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Title shown until the first frame replaces it with the FPS.
    pub title: String,
    pub render: LoopConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "quadshade".to_string(),
            render: LoopConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs the render loop until it terminates.
    ///
    /// Returns an error if the window, the graphics context or the shader
    /// program cannot be created, or if the surface fails fatally.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    render_loop: RenderLoop<WgpuBackend<'this>>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    entry: Option<WindowEntry>,
    pending: InputFrame,

    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            entry: None,
            pending: InputFrame::default(),
            exit_requested: false,
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (width, height) = self.config.render.window_size;
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let loop_config = &self.config.render;

        let entry = WindowEntry::try_new(window, |w| build_render_loop(w, gpu_init, loop_config))?;
        entry.with_window(|w| w.request_redraw());

        self.entry = Some(entry);
        Ok(())
    }

    /// Drops the render loop (releasing GPU resources) and stops the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.entry = None;
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        self.shutdown(event_loop);
    }
}

fn build_render_loop<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    config: &LoopConfig,
) -> Result<RenderLoop<WgpuBackend<'w>>> {
    let gpu = pollster::block_on(Gpu::new(window, gpu_init))?;
    let backend = WgpuBackend::new(window, gpu);
    Ok(RenderLoop::initialize(backend, config)?)
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; pacing comes from the present mode.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        if let WindowEvent::RedrawRequested = event {
            let pending = &self.pending.events;
            let result = entry.with_render_loop_mut(|rl| rl.run_frame(pending));
            self.pending.clear();

            match result {
                Ok(LoopState::Alive) => {}
                Ok(LoopState::Terminated) => self.shutdown(event_loop),
                Err(e) => self.fail(event_loop, e),
            }
            return;
        }

        let Some(ev) = translate_window_event(&event) else {
            return;
        };
        self.pending.push_event(ev);

        // Quit is honoured right away; a hidden window may never get a redraw.
        if self.pending.exit_requested() {
            let pending = &self.pending.events;
            let state = entry.with_render_loop_mut(|rl| rl.poll_events(pending));
            self.pending.clear();

            if state == LoopState::Terminated {
                self.shutdown(event_loop);
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.entry = None;
    }
}
