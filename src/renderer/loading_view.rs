//! Pulsing full-screen gradient shown while no model is ready.

use crate::error::ViewerError;
use crate::gpu::globals::{GlobalsBlock, LoadingGlobals};
use crate::gpu::render_context::{RenderContext, DEPTH_FORMAT};
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};

/// Loading placeholder drawn inside the scene pass.
pub struct LoadingView {
    pipeline: wgpu::RenderPipeline,
    globals: GlobalsBlock<LoadingGlobals>,
    values: LoadingGlobals,
}

impl LoadingView {
    /// Build the pipeline for the scene's sample count.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if the loading shader fails to
    /// compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        pulse_speed: f32,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let values = LoadingGlobals {
            pulse_speed,
            ..LoadingGlobals::default()
        };
        let globals = GlobalsBlock::new(
            device,
            "Loading Globals",
            ShaderKind::Loading.globals(),
            &values,
        )?;
        let shader = composer.compose(device, ShaderKind::Loading)?;

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Loading Pipeline Layout"),
                bind_group_layouts: &[globals.layout()],
                push_constant_ranges: &[],
            });

        // Drawn in the scene pass, so it must match its depth attachment.
        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Loading Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: context.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            globals,
            values,
        })
    }

    /// Advance the pulse clock and upload it.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: f32) {
        self.values.time += dt.max(0.0);
        self.globals.write(queue, &self.values);
    }

    /// Restart the pulse from zero.
    pub fn reset(&mut self) {
        self.values.time = 0.0;
    }

    /// Draw the gradient over the whole target.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, self.globals.bind_group(), &[]);
        pass.draw(0..3, 0..1);
    }
}
