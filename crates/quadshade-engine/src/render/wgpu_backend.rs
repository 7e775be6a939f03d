use std::num::NonZeroU64;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{DrawStatus, QuadMesh, QuadVertex, RenderBackend};
use crate::shader::ShaderProgram;

/// Uniform buffers are padded to this size.
const UNIFORM_ALIGN: u64 = 16;

/// [`RenderBackend`] over wgpu, drawing into the window surface.
pub struct WgpuBackend<'w> {
    window: &'w Window,
    gpu: Gpu<'w>,
    clear: wgpu::Color,

    pipeline: Option<wgpu::RenderPipeline>,
    bind_group: Option<wgpu::BindGroup>,
    uniform_buffers: Vec<(u32, wgpu::Buffer)>,
    quad_vbo: Option<wgpu::Buffer>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(window: &'w Window, gpu: Gpu<'w>) -> Self {
        Self {
            window,
            gpu,
            clear: wgpu::Color::BLACK,
            pipeline: None,
            bind_group: None,
            uniform_buffers: Vec::new(),
            quad_vbo: None,
        }
    }

    fn create_uniform_bindings(
        &mut self,
        program: &ShaderProgram,
    ) -> Result<Option<wgpu::BindGroupLayout>> {
        if program.uniforms().is_empty() {
            return Ok(None);
        }
        let device = self.gpu.device();

        let mut layout_entries = Vec::with_capacity(program.uniforms().len());
        let mut buffers = Vec::with_capacity(program.uniforms().len());

        for slot in program.uniforms() {
            let min_binding_size = NonZeroU64::new(slot.ty().size())
                .context("uniform types have non-zero size")?;

            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding(),
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(min_binding_size),
                },
                count: None,
            });

            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(slot.name()),
                contents: &padded(slot.value().as_bytes()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            buffers.push((slot.binding(), buffer));
        }

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quadshade uniforms bgl"),
            entries: &layout_entries,
        });

        let entries: Vec<wgpu::BindGroupEntry<'_>> = buffers
            .iter()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quadshade uniforms bind group"),
            layout: &layout,
            entries: &entries,
        });

        self.bind_group = Some(bind_group);
        self.uniform_buffers = buffers;
        Ok(Some(layout))
    }

    fn build_pipeline(&mut self, program: &ShaderProgram) -> Result<()> {
        let bind_group_layout = self.create_uniform_bindings(program)?;
        let device = self.gpu.device();

        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quadshade vertex shader"),
            source: wgpu::ShaderSource::Wgsl(program.vertex().source().into()),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quadshade fragment shader"),
            source: wgpu::ShaderSource::Wgsl(program.fragment().source().into()),
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quadshade pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quadshade pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(program.vertex().entry_point()),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(program.fragment().entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline = Some(pipeline);
        Ok(())
    }
}

impl RenderBackend for WgpuBackend<'_> {
    fn create_program(&mut self, program: &ShaderProgram) -> Result<()> {
        // Validation errors are otherwise routed to wgpu's panicking handler.
        let scope = self
            .gpu
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let built = self.build_pipeline(program);

        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!("shader program failed to link: {err}");
        }
        built?;

        log::info!(
            "shader program linked ({}/{})",
            program.vertex().entry_point(),
            program.fragment().entry_point()
        );
        Ok(())
    }

    fn upload_quad(&mut self, mesh: &QuadMesh) -> Result<()> {
        let vbo = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quadshade quad vbo"),
                contents: mesh.as_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.quad_vbo = Some(vbo);
        log::debug!("uploaded {}-vertex quad", mesh.vertex_count());
        Ok(())
    }

    fn write_uniform(&mut self, binding: u32, bytes: &[u8]) {
        let Some((_, buffer)) = self.uniform_buffers.iter().find(|(b, _)| *b == binding) else {
            return;
        };
        self.gpu.queue().write_buffer(buffer, 0, bytes);
    }

    fn draw(&mut self, vertex_count: u32) -> Result<DrawStatus> {
        if self.pipeline.is_none() || self.quad_vbo.is_none() {
            return Ok(DrawStatus::Skipped);
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let reason = err.to_string();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        Err(anyhow::anyhow!("surface error is unrecoverable: {reason}"))
                    }
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        Ok(DrawStatus::Skipped)
                    }
                };
            }
        };

        // Checked above; the frame is acquired before borrowing them.
        let (Some(pipeline), Some(vbo)) = (self.pipeline.as_ref(), self.quad_vbo.as_ref()) else {
            return Ok(DrawStatus::Skipped);
        };

        // The pass borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quadshade pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            if let Some(bind_group) = self.bind_group.as_ref() {
                rpass.set_bind_group(0, bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.draw(0..vertex_count, 0..1);
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        Ok(DrawStatus::Presented)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn release(&mut self) {
        let had_resources = self.pipeline.is_some() || self.quad_vbo.is_some();

        if let Some(vbo) = self.quad_vbo.take() {
            vbo.destroy();
        }
        for (_, buffer) in self.uniform_buffers.drain(..) {
            buffer.destroy();
        }
        self.bind_group = None;
        self.pipeline = None;

        if had_resources {
            log::debug!("released GPU resources");
        }
    }
}

/// Copies `bytes` into a zeroed buffer rounded up to [`UNIFORM_ALIGN`].
fn padded(bytes: &[u8]) -> Vec<u8> {
    let len = (bytes.len() as u64).next_multiple_of(UNIFORM_ALIGN) as usize;
    let mut out = vec![0u8; len];
    out[..bytes.len()].copy_from_slice(bytes);
    out
}
