//! Bounding-box overlay drawn as a line list inside the scene pass: one
//! cyan box per instance and a yellow box around the whole model.

use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::error::ViewerError;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};
use crate::renderer::instances::{Instance, InstanceRaw, InstanceSet};

/// Unit-cube corners; the shader maps them onto the model bounds.
const CORNERS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// The 12 box edges as corner index pairs.
const EDGES: [u16; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, // back face
    4, 5, 5, 6, 6, 7, 7, 4, // front face
    0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
];

/// Transform mapping the model bounds onto the box enclosing every
/// instance. Flat axes keep a unit scale so the box stays finite.
#[must_use]
pub fn enclosing_transform(
    instances: &[Instance],
    bounds_min: Vec3,
    bounds_max: Vec3,
) -> Mat4 {
    let Some((lo, hi)) = instances
        .iter()
        .flat_map(|i| {
            [
                i.model.transform_point3(bounds_min),
                i.model.transform_point3(bounds_max),
            ]
        })
        .fold(None, |acc: Option<(Vec3, Vec3)>, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
    else {
        return Mat4::IDENTITY;
    };

    let size = bounds_max - bounds_min;
    let scale = Vec3::select(
        size.cmpgt(Vec3::splat(f32::EPSILON)),
        (hi - lo) / size,
        Vec3::ONE,
    );
    Mat4::from_translation(lo)
        * Mat4::from_scale(scale)
        * Mat4::from_translation(-bounds_min)
}

/// Bounding-box line pipeline, its shared cube geometry and the
/// whole-model box transform.
pub struct BoundingBoxPass {
    pipeline: wgpu::RenderPipeline,
    corner_buffer: wgpu::Buffer,
    edge_buffer: wgpu::Buffer,
    model_box: wgpu::Buffer,
}

impl BoundingBoxPass {
    /// Build the pipeline for the scene's sample count.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if the shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let device = &context.device;
        let shader = composer.compose(device, ShaderKind::BoundingBox)?;

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Bounding Box Pipeline Layout"),
                bind_group_layouts: &[globals_layout],
                push_constant_ranges: &[],
            });

        let corner_layout = wgpu::VertexBufferLayout {
            array_stride: size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        };

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Bounding Box Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[corner_layout, InstanceRaw::layout()],
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
                depth_stencil: Some(pipeline_helpers::depth_less(false)),
                multisample: wgpu::MultisampleState {
                    count: context.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            });

        let corner_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bounding Box Corners"),
                contents: bytemuck::cast_slice(&CORNERS),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let edge_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bounding Box Edges"),
                contents: bytemuck::cast_slice(&EDGES),
                usage: wgpu::BufferUsages::INDEX,
            });

        // Id 0 marks the whole-model box for the shader.
        let model_box =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Model Bounding Box"),
                contents: bytemuck::bytes_of(&model_box_raw(Mat4::IDENTITY)),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        Ok(Self {
            pipeline,
            corner_buffer,
            edge_buffer,
            model_box,
        })
    }

    /// Fit the whole-model box around every instance of `instances`.
    pub fn fit_model_box(&self, queue: &wgpu::Queue, instances: &InstanceSet) {
        let (min, max) = instances.bounds();
        let transform = enclosing_transform(instances.instances(), min, max);
        queue.write_buffer(
            &self.model_box,
            0,
            bytemuck::bytes_of(&model_box_raw(transform)),
        );
    }

    /// Draw one box per instance, then the whole-model box.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        globals: &wgpu::BindGroup,
        instances: &InstanceSet,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_vertex_buffer(0, self.corner_buffer.slice(..));
        pass.set_vertex_buffer(1, instances.instance_buffer().slice(..));
        pass.set_index_buffer(self.edge_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..EDGES.len() as u32, 0, 0..instances.draw_count());
        pass.set_vertex_buffer(1, self.model_box.slice(..));
        pass.draw_indexed(0..EDGES.len() as u32, 0, 0..1);
    }
}

fn model_box_raw(model: Mat4) -> InstanceRaw {
    Instance {
        id: 0,
        model,
        color: Vec4::ONE,
    }
    .to_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cube_edge_is_listed_once() {
        let mut edges: Vec<(u16, u16)> = EDGES
            .chunks_exact(2)
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        assert_eq!(edges.len(), 12);
        for (a, b) in edges {
            // Cube edges join corners differing in exactly one axis.
            let (ca, cb) = (CORNERS[a as usize], CORNERS[b as usize]);
            let diff = (0..3).filter(|&i| ca[i] != cb[i]).count();
            assert_eq!(diff, 1, "edge {a}-{b} is a diagonal");
        }
    }

    #[test]
    fn model_box_encloses_every_instance() {
        let (min, max) = (Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let instances: Vec<Instance> = [-3.0f32, 0.0, 3.0]
            .into_iter()
            .zip(1..)
            .map(|(x, id)| Instance {
                id,
                model: Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
                    * Mat4::from_scale(Vec3::splat(0.5)),
                color: Vec4::ONE,
            })
            .collect();

        let m = enclosing_transform(&instances, min, max);
        assert!(m.transform_point3(min).abs_diff_eq(Vec3::new(-3.5, 0.0, -0.5), 1e-5));
        assert!(m.transform_point3(max).abs_diff_eq(Vec3::new(3.5, 1.0, 0.5), 1e-5));
    }

    #[test]
    fn flat_model_box_stays_finite() {
        let (min, max) = (Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let instance = Instance {
            id: 1,
            model: Mat4::IDENTITY,
            color: Vec4::ONE,
        };
        let m = enclosing_transform(&[instance], min, max);
        assert!(m.is_finite());
        assert_eq!(enclosing_transform(&[], min, max), Mat4::IDENTITY);
    }
}
