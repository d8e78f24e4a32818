//! Multisampled scene target with a single-sample resolve texture and a
//! blit onto the visible surface.

use crate::error::ViewerError;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::{RenderContext, DEPTH_FORMAT};
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};
use crate::gpu::texture::{validate_extent, RenderTarget, TargetDesc};

/// Sample counts wgpu accepts for a render attachment.
const VALID_SAMPLE_COUNTS: [u32; 5] = [1, 2, 4, 8, 16];

/// Off-screen scene surface.
///
/// The scene pass renders into the MSAA colour and depth attachments;
/// ending the pass resolves colour into a texture-backed target that
/// [`draw_to_screen`](Self::draw_to_screen) samples with a full-screen
/// triangle. With a sample count of 1 the scene renders straight into the
/// resolve target.
pub struct FrameTarget {
    msaa_color: Option<RenderTarget>,
    depth: RenderTarget,
    resolve: RenderTarget,
    sample_count: u32,
    format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    blit_pipeline: wgpu::RenderPipeline,
    blit_layout: wgpu::BindGroupLayout,
    blit_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
}

impl FrameTarget {
    /// Build the targets at the context's size and sample count.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::FrameTarget`] for a zero or oversized extent
    /// or an invalid sample count, and [`ViewerError::Shader`] if the blit
    /// shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        clear_color: wgpu::Color,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let sample_count = context.sample_count;
        if !VALID_SAMPLE_COUNTS.contains(&sample_count) {
            return Err(ViewerError::FrameTarget(format!(
                "unsupported sample count {sample_count}"
            )));
        }
        validate_extent(device, context.width(), context.height())
            .map_err(ViewerError::FrameTarget)?;

        let format = context.format();
        let (msaa_color, depth, resolve) = create_targets(
            device,
            format,
            sample_count,
            context.width(),
            context.height(),
        );

        let blit_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blit Layout"),
                entries: &[
                    pipeline_helpers::texture_2d(0),
                    pipeline_helpers::filtering_sampler(1),
                ],
            });
        let sampler = pipeline_helpers::linear_sampler(device, "Blit Sampler");
        let blit_bind_group =
            create_blit_bind_group(device, &blit_layout, &resolve, &sampler);

        let shader = composer.compose(device, ShaderKind::Blit)?;
        let blit_pipeline = pipeline_helpers::create_screen_space_pipeline(
            device,
            ShaderKind::Blit.label(),
            &shader,
            format,
            None,
            &[&blit_layout],
        );

        log::debug!(
            "frame target {}x{} msaa x{sample_count}",
            context.width(),
            context.height()
        );

        Ok(Self {
            msaa_color,
            depth,
            resolve,
            sample_count,
            format,
            clear_color,
            blit_pipeline,
            blit_layout,
            blit_bind_group,
            sampler,
        })
    }

    /// Open the scene pass: clears colour and depth and covers the whole
    /// target with the viewport.
    pub fn begin_frame<'e>(
        &'e self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> wgpu::RenderPass<'e> {
        let (view, resolve_target) = match &self.msaa_color {
            Some(msaa) => (&msaa.view, Some(&self.resolve.view)),
            None => (&self.resolve.view, None),
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_viewport(
            0.0,
            0.0,
            self.width() as f32,
            self.height() as f32,
            0.0,
            1.0,
        );
        pass
    }

    /// Close the scene pass. The MSAA colour resolves into the resolve
    /// texture when the pass ends.
    pub fn end_frame(&self, pass: wgpu::RenderPass<'_>) {
        drop(pass);
    }

    /// Sample the resolved texture onto `view` with a full-screen triangle.
    pub fn draw_to_screen(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.blit_pipeline);
        pass.set_bind_group(0, &self.blit_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Recreate the targets at a new size.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::FrameTarget`] for a zero or oversized extent;
    /// the previous targets are kept in that case.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<(), ViewerError> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        validate_extent(device, width, height)
            .map_err(ViewerError::FrameTarget)?;

        let (msaa_color, depth, resolve) =
            create_targets(device, self.format, self.sample_count, width, height);
        self.msaa_color = msaa_color;
        self.depth = depth;
        self.resolve = resolve;
        self.blit_bind_group = create_blit_bind_group(
            device,
            &self.blit_layout,
            &self.resolve,
            &self.sampler,
        );
        Ok(())
    }

    /// The single-sample texture the scene resolves into.
    pub fn resolve_texture(&self) -> &wgpu::Texture {
        &self.resolve.texture
    }

    /// MSAA sample count of the scene attachments.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Colour format of the scene and resolve targets.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.resolve.width()
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.resolve.height()
    }
}

fn create_targets(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
) -> (Option<RenderTarget>, RenderTarget, RenderTarget) {
    let msaa_color = (sample_count > 1).then(|| {
        RenderTarget::new(
            device,
            &TargetDesc {
                label: "Scene MSAA Color",
                width,
                height,
                format,
                sample_count,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            },
        )
    });
    let depth = RenderTarget::new(
        device,
        &TargetDesc {
            label: "Scene Depth",
            width,
            height,
            format: DEPTH_FORMAT,
            sample_count,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        },
    );
    let resolve = RenderTarget::new(
        device,
        &TargetDesc {
            label: "Scene Resolve",
            width,
            height,
            format,
            sample_count: 1,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        },
    );
    (msaa_color, depth, resolve)
}

fn create_blit_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    resolve: &RenderTarget,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Blit Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&resolve.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
