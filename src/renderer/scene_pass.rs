//! Lit, textured, instanced mesh pipeline for the MSAA scene pass.

use crate::error::ViewerError;
use crate::gpu::material::SlotTable;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};
use crate::model::{GpuModel, Vertex};
use crate::renderer::instances::{InstanceRaw, InstanceSet};

/// Scene mesh pipeline with its resolved material slots.
pub struct ScenePass {
    pipeline: wgpu::RenderPipeline,
    slots: SlotTable,
    material_layout: wgpu::BindGroupLayout,
}

impl ScenePass {
    /// Compose the scene shader and build the pipeline for `sample_count`.
    ///
    /// Material slots are resolved here, once; uploads and draws only use
    /// the resulting [`SlotTable`].
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if the scene shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        globals_layout: &wgpu::BindGroupLayout,
        instances_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let shader = composer.compose(device, ShaderKind::Scene)?;
        let slots = SlotTable::for_kind(ShaderKind::Scene);
        let material_layout = slots.bind_group_layout(device);

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[
                    globals_layout,
                    instances_layout,
                    &material_layout,
                ],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
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
                        format: context.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
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
                multisample: wgpu::MultisampleState {
                    count: context.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            });

        Ok(Self {
            pipeline,
            slots,
            material_layout,
        })
    }

    /// Slot table the material bind groups must follow.
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Layout of the per-mesh material bind group (group 2).
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    /// Draw every instance of `model`.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        globals: &wgpu::BindGroup,
        model: &GpuModel,
        instances: &InstanceSet,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        model.draw_instanced(pass, instances);
    }
}
