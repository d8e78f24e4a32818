//! GPU-resident model: per-mesh vertex/index buffers and material bind
//! groups.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::gpu::material::{number_slots, MaterialBinder, SlotTable};
use crate::gpu::texture_registry::{TextureId, TextureRegistry};
use crate::model::ModelData;
use crate::renderer::instances::InstanceSet;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: wgpu::BindGroup,
}

/// A model uploaded to the GPU. Created on the render thread from
/// [`ModelData`] produced anywhere.
pub struct GpuModel {
    meshes: Vec<GpuMesh>,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl GpuModel {
    /// Upload every mesh of `data`.
    ///
    /// Textures go through `registry`, so a texture shared by several
    /// meshes (or uploaded by an earlier model) is stored once. Slots the
    /// shader has no binding for are logged and skipped; empty slots keep
    /// the registry's white fallback.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &ModelData,
        registry: &mut TextureRegistry,
        slots: &SlotTable,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        for image in &data.images {
            let _ = registry.get_or_upload(device, queue, image);
        }

        let registry: &TextureRegistry = registry;
        let meshes = data
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| {
                let mut binder = MaterialBinder::new(
                    slots,
                    registry.view(registry.fallback()),
                );
                let numbered =
                    number_slots(mesh.textures.iter().map(|t| t.role));
                for (slot, texture) in numbered.into_iter().zip(&mesh.textures)
                {
                    let id: TextureId = match registry.get(&texture.key) {
                        Some(id) => id,
                        None => {
                            log::warn!(
                                "{}: texture {} was not decoded",
                                mesh.name,
                                texture.key
                            );
                            continue;
                        }
                    };
                    let _ = binder.assign(slot, registry.view(id));
                }

                GpuMesh {
                    vertex_buffer: device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{} Vertices", mesh.name)),
                            contents: bytemuck::cast_slice(&mesh.vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        },
                    ),
                    index_buffer: device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{} Indices", mesh.name)),
                            contents: bytemuck::cast_slice(&mesh.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        },
                    ),
                    index_count: mesh.indices.len() as u32,
                    material: binder.build(
                        device,
                        material_layout,
                        registry.sampler(),
                        &format!("{} Material", mesh.name),
                    ),
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "uploaded model: {} meshes, {} textures in registry",
            meshes.len(),
            registry.len()
        );

        Self {
            meshes,
            bounds_min: data.bounds_min(),
            bounds_max: data.bounds_max(),
        }
    }

    /// Model-space bounding box minimum.
    pub fn bounds_min(&self) -> Vec3 {
        self.bounds_min
    }

    /// Model-space bounding box maximum.
    pub fn bounds_max(&self) -> Vec3 {
        self.bounds_max
    }

    /// Number of uploaded meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Draw every mesh once per instance, with materials at group 2.
    ///
    /// The caller has set the pipeline and group 0. Group 1 and the
    /// instance vertex buffer come from `instances`.
    pub fn draw_instanced(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        instances: &InstanceSet,
    ) {
        self.draw(pass, instances, true);
    }

    /// Like [`draw_instanced`](Self::draw_instanced) but without binding
    /// materials, for pipelines that have no group 2.
    pub fn draw_geometry(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        instances: &InstanceSet,
    ) {
        self.draw(pass, instances, false);
    }

    fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        instances: &InstanceSet,
        materials: bool,
    ) {
        pass.set_bind_group(1, instances.bind_group(), &[]);
        pass.set_vertex_buffer(1, instances.instance_buffer().slice(..));
        let count = instances.draw_count();
        for mesh in &self.meshes {
            if materials {
                pass.set_bind_group(2, &mesh.material, &[]);
            }
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(
                mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..mesh.index_count, 0, 0..count);
        }
    }
}
