//! Instanced copies of the model and their persistent drag offsets.
//!
//! Instance transforms are generated once per model from a
//! [`LayoutPolicy`]. The only mutable per-instance state is a 2-D offset
//! that accumulates while the instance is dragged and is never reset by
//! pointer release. Offsets live in a storage buffer indexed by `id - 1`,
//! so the instance count is not limited by uniform array sizes.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::gpu::dynamic_buffer::DynamicBuffer;
use crate::gpu::pipeline_helpers;

/// Per-instance vertex data. Mirrors `InstanceInput` in
/// `modules/instancing.wgsl` (locations 5 through 10).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// 1-based instance id.
    pub id: u32,
    _pad: [u32; 3],
    /// Instance tint.
    pub color: [f32; 4],
}

impl InstanceRaw {
    /// Instance-rate vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 5,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 16,
                    shader_location: 6,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 32,
                    shader_location: 7,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 48,
                    shader_location: 8,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Uint32,
                    offset: 64,
                    shader_location: 9, // id
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 80,
                    shader_location: 10, // color
                },
            ],
        }
    }
}

/// One placed copy of the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    /// 1-based id; 0 is reserved for background.
    pub id: u32,
    /// Model-to-world transform.
    pub model: Mat4,
    /// Tint multiplied into the material color.
    pub color: Vec4,
}

impl Instance {
    /// GPU representation.
    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.model.to_cols_array_2d(),
            id: self.id,
            _pad: [0; 3],
            color: self.color.to_array(),
        }
    }

    /// World-space position of the model's bounding-box centre.
    pub fn centre(&self, bounds_min: Vec3, bounds_max: Vec3) -> Vec3 {
        self.model.transform_point3((bounds_min + bounds_max) * 0.5)
    }
}

/// Accumulated drag offset of one instance.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct InstanceOffset {
    /// Horizontal offset, world units per unit weight.
    pub dx: f32,
    /// Vertical offset (screen-down positive), world units per unit weight.
    pub dy: f32,
}

/// How instances are placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    /// Uniform scale applied to the model.
    pub scale: f32,
    /// Slot spacing as a multiple of the scaled model width.
    pub spacing: f32,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            scale: 0.1,
            spacing: 1.0,
        }
    }
}

const PALETTE: [Vec4; 4] = [
    Vec4::new(1.0, 1.0, 1.0, 1.0),
    Vec4::new(0.85, 0.95, 1.0, 1.0),
    Vec4::new(1.0, 0.9, 0.85, 1.0),
    Vec4::new(0.9, 1.0, 0.88, 1.0),
];

/// Place `count` instances along X.
///
/// Slot `i` sits at `(i - (count - 1) / 2) * width`, where `width` is the
/// scaled model width times the policy spacing. Each model is recentred on
/// its bounding box so the slots are symmetric about the origin.
pub fn generate_instances(
    policy: &LayoutPolicy,
    count: u32,
    bounds_min: Vec3,
    bounds_max: Vec3,
) -> Vec<Instance> {
    let centre = (bounds_min + bounds_max) * 0.5;
    let width = (bounds_max.x - bounds_min.x) * policy.scale * policy.spacing;
    let middle = (count.saturating_sub(1)) as f32 * 0.5;
    (0..count)
        .map(|i| {
            let x = (i as f32 - middle) * width;
            let model = Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
                * Mat4::from_scale(Vec3::splat(policy.scale))
                * Mat4::from_translation(-centre);
            Instance {
                id: i + 1,
                model,
                color: PALETTE[i as usize % PALETTE.len()],
            }
        })
        .collect()
}

/// CPU copy of every instance's accumulated offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetTable {
    offsets: Vec<InstanceOffset>,
}

impl OffsetTable {
    /// `count` zero offsets.
    pub fn new(count: usize) -> Self {
        Self {
            offsets: vec![InstanceOffset::default(); count],
        }
    }

    /// Add `delta` to instance `id`'s offset and return the new value, or
    /// `None` for ids outside `1..=len`.
    pub fn accumulate(&mut self, id: u32, delta: Vec2) -> Option<InstanceOffset> {
        let slot = self.offsets.get_mut(index_of(id)?)?;
        slot.dx += delta.x;
        slot.dy += delta.y;
        Some(*slot)
    }

    /// Offset of instance `id`.
    pub fn get(&self, id: u32) -> Option<InstanceOffset> {
        self.offsets.get(index_of(id)?).copied()
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if there are no instances.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets in id order (index `i` is id `i + 1`).
    pub fn as_slice(&self) -> &[InstanceOffset] {
        &self.offsets
    }
}

fn index_of(id: u32) -> Option<usize> {
    (id as usize).checked_sub(1)
}

const FALLBACK: Instance = Instance {
    id: 0,
    model: Mat4::IDENTITY,
    color: Vec4::ONE,
};

/// GPU-side instance transforms and offsets.
///
/// Until [`configure`](Self::configure) is called the set holds a single
/// identity instance with id 0, so drawing still produces one untinted,
/// unpickable copy.
pub struct InstanceSet {
    instances: Vec<Instance>,
    instance_buffer: DynamicBuffer<InstanceRaw>,
    offsets: OffsetTable,
    offset_buffer: DynamicBuffer<InstanceOffset>,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    bounds: (Vec3, Vec3),
}

impl InstanceSet {
    /// Create an unconfigured set.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Instance Offsets Layout"),
                entries: &[pipeline_helpers::vertex_storage_buffer(0)],
            });

        let mut instance_buffer = DynamicBuffer::with_capacity(
            device,
            "Instance Transforms",
            1,
            wgpu::BufferUsages::VERTEX,
        );
        let _ = instance_buffer.write(device, queue, &[FALLBACK.to_raw()]);

        let offset_buffer = DynamicBuffer::with_capacity(
            device,
            "Instance Offsets",
            1,
            wgpu::BufferUsages::STORAGE,
        );
        let bind_group = create_bind_group(device, &layout, &offset_buffer);

        Self {
            instances: Vec::new(),
            instance_buffer,
            offsets: OffsetTable::default(),
            offset_buffer,
            layout,
            bind_group,
            bounds: (Vec3::ZERO, Vec3::ZERO),
        }
    }

    /// Generate `count` instances for a model with the given bounds and
    /// upload them with zeroed offsets.
    pub fn configure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        policy: &LayoutPolicy,
        count: u32,
        bounds_min: Vec3,
        bounds_max: Vec3,
    ) {
        self.instances = generate_instances(policy, count, bounds_min, bounds_max);
        self.bounds = (bounds_min, bounds_max);
        self.offsets = OffsetTable::new(self.instances.len());

        let raw: Vec<InstanceRaw> = if self.instances.is_empty() {
            vec![FALLBACK.to_raw()]
        } else {
            self.instances.iter().map(Instance::to_raw).collect()
        };
        let _ = self.instance_buffer.write(device, queue, &raw);
        if self.offset_buffer.write(device, queue, self.offsets.as_slice()) {
            self.bind_group =
                create_bind_group(device, &self.layout, &self.offset_buffer);
        }
        log::debug!(
            "configured {} instances, width {:.3}",
            self.instances.len(),
            (bounds_max.x - bounds_min.x) * policy.scale
        );
    }

    /// Write the full offset array to the GPU.
    pub fn upload_offsets(&mut self, queue: &wgpu::Queue) {
        if !self.offset_buffer.write_in_place(queue, self.offsets.as_slice()) {
            log::warn!("offset buffer smaller than offset table; reconfigure");
        }
    }

    /// Accumulate `delta` into instance `id` and write only that element.
    ///
    /// Returns `false` (and logs) for an unknown id.
    pub fn apply_offset(&mut self, queue: &wgpu::Queue, id: u32, delta: Vec2) -> bool {
        let Some(offset) = self.offsets.accumulate(id, delta) else {
            log::warn!("offset for unknown instance {id} ignored");
            return false;
        };
        self.offset_buffer.write_at(queue, id as usize - 1, &offset)
    }

    /// Current offset of instance `id`.
    pub fn offset(&self, id: u32) -> Option<InstanceOffset> {
        self.offsets.get(id)
    }

    /// Configured instances (empty before [`configure`](Self::configure)).
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Configured instance count.
    pub fn count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Instances to draw: the configured count, or the single fallback.
    pub fn draw_count(&self) -> u32 {
        self.instance_buffer.count() as u32
    }

    /// Model bounds the instances were configured for.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.bounds
    }

    /// Instance-rate vertex buffer (slot 1).
    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        self.instance_buffer.buffer()
    }

    /// Layout of the offsets bind group (group 1).
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Offsets bind group (group 1).
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    offsets: &DynamicBuffer<InstanceOffset>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Instance Offsets Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: offsets.buffer().as_entire_binding(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use super::*;

    fn unit_bounds() -> (Vec3, Vec3) {
        (Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    #[test]
    fn instance_raw_matches_shader_locations() {
        assert_eq!(size_of::<InstanceRaw>(), 96);
        assert_eq!(offset_of!(InstanceRaw, id), 64);
        assert_eq!(offset_of!(InstanceRaw, color), 80);
    }

    #[test]
    fn instances_are_spaced_by_scaled_width() {
        let (min, max) = unit_bounds();
        let policy = LayoutPolicy {
            scale: 2.0,
            spacing: 1.0,
        };
        let instances = generate_instances(&policy, 4, min, max);
        let xs: Vec<f32> =
            instances.iter().map(|i| i.centre(min, max).x).collect();
        assert_eq!(xs, [-3.0, -1.0, 1.0, 3.0]);
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ids_are_one_based() {
        let (min, max) = unit_bounds();
        let instances =
            generate_instances(&LayoutPolicy::default(), 3, min, max);
        let ids: Vec<u32> = instances.iter().map(|i| i.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn single_instance_is_centred() {
        let min = Vec3::new(2.0, 0.0, 0.0);
        let max = Vec3::new(4.0, 1.0, 1.0);
        let instances =
            generate_instances(&LayoutPolicy::default(), 1, min, max);
        assert!(instances[0].centre(min, max).length() < 1e-6);
    }

    #[test]
    fn zero_instances() {
        let (min, max) = unit_bounds();
        assert!(generate_instances(&LayoutPolicy::default(), 0, min, max).is_empty());
    }

    #[test]
    fn offsets_accumulate_per_instance() {
        let mut table = OffsetTable::new(4);
        let _ = table.accumulate(2, Vec2::new(0.1, 0.0));
        let _ = table.accumulate(2, Vec2::new(0.1, -0.2));
        let two = table.get(2).unwrap();
        assert!((two.dx - 0.2).abs() < 1e-6);
        assert!((two.dy + 0.2).abs() < 1e-6);
        assert_eq!(table.get(1), Some(InstanceOffset::default()));
    }

    #[test]
    fn offsets_survive_switching_selection() {
        let mut table = OffsetTable::new(4);
        let _ = table.accumulate(1, Vec2::new(0.5, 0.0));
        let _ = table.accumulate(3, Vec2::new(0.0, 0.5));
        let _ = table.accumulate(1, Vec2::new(0.5, 0.0));
        assert_eq!(table.get(1).unwrap().dx, 1.0);
        assert_eq!(table.get(3).unwrap().dy, 0.5);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut table = OffsetTable::new(2);
        assert!(table.accumulate(0, Vec2::ONE).is_none());
        assert!(table.accumulate(3, Vec2::ONE).is_none());
        assert!(table.get(0).is_none());
        assert!(table.as_slice().iter().all(|o| *o == InstanceOffset::default()));
    }
}
