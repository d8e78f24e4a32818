//! World-axis helper: three colored lines from the origin, drawn over the
//! scene every frame a model is shown.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::error::ViewerError;
use crate::gpu::render_context::{RenderContext, DEPTH_FORMAT};
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};

/// Fraction of the model's depth used as the axis length.
const AXIS_DEPTH_FRACTION: f32 = 0.1;

const AXIS_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// One axis line endpoint.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AxisVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Line color.
    pub color: [f32; 3],
}

/// Axis length for a model with the given bounds.
#[must_use]
pub fn axis_length(bounds_min: Vec3, bounds_max: Vec3) -> f32 {
    (bounds_max.z - bounds_min.z).abs() * AXIS_DEPTH_FRACTION
}

/// X red, Y green, Z blue, each from the origin to `length`.
#[must_use]
pub fn axis_vertices(length: f32) -> [AxisVertex; 6] {
    let axes = [
        (Vec3::X, [1.0, 0.0, 0.0]),
        (Vec3::Y, [0.0, 1.0, 0.0]),
        (Vec3::Z, [0.0, 0.0, 1.0]),
    ];
    let mut vertices = [AxisVertex {
        position: [0.0; 3],
        color: [0.0; 3],
    }; 6];
    for (pair, (direction, color)) in vertices.chunks_exact_mut(2).zip(axes) {
        pair[0].color = color;
        pair[1] = AxisVertex {
            position: (direction * length).to_array(),
            color,
        };
    }
    vertices
}

/// Axis line pipeline and its six vertices.
///
/// Depth testing is off so the axes stay visible through the model.
pub struct AxisPass {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
}

impl AxisPass {
    /// Build the pipeline for the scene's sample count.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if the axis shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let shader = composer.compose(device, ShaderKind::Axis)?;

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Axis Pipeline Layout"),
                bind_group_layouts: &[globals_layout],
                push_constant_ranges: &[],
            });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: size_of::<AxisVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &AXIS_ATTRIBUTES,
        };

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Axis Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_layout],
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
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
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

        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Axis Vertices"),
                contents: bytemuck::cast_slice(&axis_vertices(1.0)),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Ok(Self {
            pipeline,
            vertex_buffer,
        })
    }

    /// Resize the axes, typically to [`axis_length`] of a new model.
    pub fn set_length(&self, queue: &wgpu::Queue, length: f32) {
        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&axis_vertices(length)),
        );
    }

    /// Draw the three axes.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, globals: &wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_start_at_origin_and_share_length() {
        let vertices = axis_vertices(0.5);
        for (pair, direction) in vertices.chunks_exact(2).zip([Vec3::X, Vec3::Y, Vec3::Z]) {
            assert_eq!(pair[0].position, [0.0; 3]);
            assert_eq!(Vec3::from(pair[1].position), direction * 0.5);
            assert_eq!(pair[0].color, pair[1].color);
            // Each axis is tinted by its own channel.
            assert_eq!(Vec3::from(pair[0].color), direction);
        }
    }

    #[test]
    fn length_follows_model_depth() {
        let len = axis_length(Vec3::new(-1.0, -1.0, -2.0), Vec3::new(1.0, 1.0, 3.0));
        assert!((len - 0.5).abs() < 1e-6);
        assert_eq!(axis_length(Vec3::ZERO, Vec3::new(4.0, 4.0, 0.0)), 0.0);
    }
}
