//! GPU picking using a dedicated render pass.
//!
//! Renders `instance_index + 1` for every instance into an R32Uint target,
//! then reads back the texel under the pointer. This matches exactly what
//! the scene pass draws, because both use the same displacement code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec2;

use super::result::{PickResult, CLEAR_SENTINEL};
use super::surface::{in_bounds, PickSurface, PICK_FORMAT};
use crate::error::ViewerError;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderKind, ShaderComposer};
use crate::model::{GpuModel, Vertex};
use crate::renderer::instances::{InstanceRaw, InstanceSet};

/// Copies must use a 256-byte aligned row pitch, so one texel needs a full
/// row of staging space.
const STAGING_SIZE: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

/// What the picking pass draws.
pub struct PickScene<'a> {
    /// Scene globals bind group (camera matrices, clock).
    pub globals: &'a wgpu::BindGroup,
    /// Uploaded model.
    pub model: &'a GpuModel,
    /// Instance transforms and offsets.
    pub instances: &'a InstanceSet,
}

/// Offscreen id pass with synchronous single-texel readback.
pub struct PickingPass {
    surface: Option<PickSurface>,
    pipeline: wgpu::RenderPipeline,
    staging_buffer: wgpu::Buffer,
}

impl PickingPass {
    /// Build the picking pipeline and a surface matching the context size.
    ///
    /// A surface that cannot be created is logged and leaves picking
    /// unavailable; only pipeline construction is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if the picking shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        globals_layout: &wgpu::BindGroupLayout,
        instances_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let shader = composer.compose(device, ShaderKind::Picking)?;

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Picking Pipeline Layout"),
                bind_group_layouts: &[globals_layout, instances_layout],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Picking Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout(), InstanceRaw::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: PICK_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(pipeline_helpers::depth_less(true)),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Picking Staging Buffer"),
            size: STAGING_SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let surface = create_surface(device, context.width(), context.height());

        Ok(Self {
            surface,
            pipeline,
            staging_buffer,
        })
    }

    /// `true` if the pick surface exists.
    pub fn is_available(&self) -> bool {
        self.surface.is_some()
    }

    /// Recreate the pick surface for the new size. On failure picking
    /// becomes unavailable until the next successful resize.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if let Some(surface) = &self.surface {
            if surface.width() == width && surface.height() == height {
                return;
            }
        }
        self.surface = create_surface(device, width, height);
    }

    /// Render the id pass and read back the instance under `pointer`
    /// (window pixels, top-left origin).
    ///
    /// Records into its own encoder and submits it, so no pipeline, target
    /// or viewport state is shared with the caller's frame. Blocks until
    /// the readback completes.
    pub fn perform_pick(
        &self,
        context: &RenderContext,
        scene: &PickScene<'_>,
        pointer: Vec2,
    ) -> PickResult {
        let Some(surface) = &self.surface else {
            log::warn!("pick requested but the pick surface is unavailable");
            return PickResult::Unavailable;
        };
        if !in_bounds(pointer.x, pointer.y, surface.width(), surface.height()) {
            log::debug!("pick at {pointer} is outside the viewport");
            return PickResult::Background;
        }
        // wgpu texel origin is top-left, same as window coordinates.
        let (x, y) = (pointer.x as u32, pointer.y as u32);

        let mut encoder = context.create_encoder("Picking Encoder");
        self.encode_picking_pass(&mut encoder, surface, scene);
        self.copy_texel_to_staging(&mut encoder, surface, x, y);
        context.submit(encoder);

        let Some(texel) = self.read_staging(&context.device) else {
            return PickResult::Background;
        };
        let result = PickResult::from_texel(texel, scene.instances.count());
        log::debug!("pick at ({x}, {y}): texel {texel:#x} -> {result:?}");
        result
    }

    fn encode_picking_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface: &PickSurface,
        scene: &PickScene<'_>,
    ) {
        let mut render_pass =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Picking Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface.color().view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(CLEAR_SENTINEL),
                            g: 0.0,
                            b: 0.0,
                            a: 0.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &surface.depth().view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    },
                ),
                ..Default::default()
            });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, scene.globals, &[]);
        scene.model.draw_geometry(&mut render_pass, scene.instances);
    }

    fn copy_texel_to_staging(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface: &PickSurface,
        x: u32,
        y: u32,
    ) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &surface.color().texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Map the staging buffer, wait for the GPU, and read one `u32`.
    fn read_staging(&self, device: &wgpu::Device) -> Option<u32> {
        let map_complete = Arc::new(AtomicBool::new(false));
        let signal = Arc::clone(&map_complete);
        let buffer_slice = self.staging_buffer.slice(..4);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            if result.is_ok() {
                signal.store(true, Ordering::SeqCst);
            }
        });

        if let Err(e) = device.poll(wgpu::PollType::Wait) {
            log::warn!("pick readback poll failed: {e}");
        }
        if !map_complete.load(Ordering::SeqCst) {
            log::warn!("pick readback buffer did not map");
            return None;
        }

        let data = buffer_slice.get_mapped_range();
        let texel = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        drop(data);
        self.staging_buffer.unmap();
        Some(texel)
    }
}

fn create_surface(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> Option<PickSurface> {
    match PickSurface::new(device, width, height) {
        Ok(surface) => Some(surface),
        Err(e) => {
            log::warn!("picking disabled: {e}");
            None
        }
    }
}
