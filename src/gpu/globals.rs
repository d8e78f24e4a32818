//! Uniform "globals" blocks shared by the shader kinds.
//!
//! Every shader that takes globals reads them from group 0,
//! [`GLOBALS_BINDING`]. The block layout is fixed per
//! [`ShaderKind`](crate::gpu::shader_composer::ShaderKind) through its
//! [`GlobalsSchema`].

use std::marker::PhantomData;
use std::mem::offset_of;

use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::error::ViewerError;

/// Binding index of the globals uniform inside group 0.
pub const GLOBALS_BINDING: u32 = 0;

/// Seconds after which the shader clock wraps back to zero.
pub const TIME_WRAP: f32 = 10.0;

/// Per-frame scene uniforms. Mirrors `SceneGlobals` in
/// `modules/globals.wgsl`; field order and padding must match.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneGlobals {
    /// Projection matrix.
    pub proj: [[f32; 4]; 4],
    /// View matrix.
    pub view: [[f32; 4]; 4],
    /// Model matrix applied before the per-instance transform.
    pub model: [[f32; 4]; 4],
    /// Shader clock in seconds, wrapped at [`TIME_WRAP`].
    pub time: f32,
    /// Wind sway amplitude.
    pub wave_amp: f32,
    /// Wind sway speed.
    pub wave_speed: f32,
    /// Selected instance id (0 = none).
    pub picked_instance_id: i32,
    /// Global tint.
    pub color: [f32; 4],
    /// Model-space bounding box minimum.
    pub bound_min: [f32; 3],
    /// Last pointer drag delta, x.
    pub delta_x: f32,
    /// Model-space bounding box maximum.
    pub bound_max: [f32; 3],
    /// Last pointer drag delta, y.
    pub delta_y: f32,
    /// Camera eye position (w unused).
    pub view_pos: [f32; 4],
}

impl Default for SceneGlobals {
    fn default() -> Self {
        Self {
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            time: 0.0,
            wave_amp: 1.0,
            wave_speed: 5.0,
            picked_instance_id: 0,
            color: Vec4::ONE.to_array(),
            bound_min: [0.0; 3],
            delta_x: 0.0,
            bound_max: [0.0; 3],
            delta_y: 0.0,
            view_pos: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SceneGlobals {
    /// Set the camera matrices and eye position.
    pub fn set_camera(&mut self, view: Mat4, proj: Mat4, eye: Vec3) {
        self.view = view.to_cols_array_2d();
        self.proj = proj.to_cols_array_2d();
        self.view_pos = eye.extend(1.0).to_array();
    }

    /// Set the model bounds used by the sway and bounding-box shaders.
    pub fn set_bounds(&mut self, min: Vec3, max: Vec3) {
        self.bound_min = min.to_array();
        self.bound_max = max.to_array();
    }

    /// Advance the shader clock, wrapping at [`TIME_WRAP`].
    pub fn advance_time(&mut self, dt: f32) {
        self.time = (self.time + dt).rem_euclid(TIME_WRAP);
    }
}

/// Uniforms for the loading view.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LoadingGlobals {
    /// Seconds since the loading view appeared.
    pub time: f32,
    /// Pulse frequency in radians per second.
    pub pulse_speed: f32,
    pub(crate) _pad: [f32; 2],
}

/// Which uniform block a shader kind expects at [`GLOBALS_BINDING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalsSchema {
    /// [`SceneGlobals`].
    Scene,
    /// [`LoadingGlobals`].
    Loading,
    /// No globals block.
    None,
}

impl GlobalsSchema {
    /// Block size in bytes (0 for [`GlobalsSchema::None`]).
    pub fn size(self) -> u64 {
        match self {
            Self::Scene => size_of::<SceneGlobals>() as u64,
            Self::Loading => size_of::<LoadingGlobals>() as u64,
            Self::None => 0,
        }
    }
}

/// A uniform buffer holding one `T`, plus its bind group.
pub struct GlobalsBlock<T> {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> GlobalsBlock<T> {
    /// Create the block for a shader whose schema is `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] when `T` does not have the size the
    /// schema declares.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        schema: GlobalsSchema,
        initial: &T,
    ) -> Result<Self, ViewerError> {
        let size = size_of::<T>() as u64;
        if schema.size() != size {
            return Err(ViewerError::Shader(format!(
                "{label}: globals block is {size} bytes, schema {schema:?} \
                 expects {}",
                schema.size()
            )));
        }

        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(initial),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Layout")),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: GLOBALS_BINDING,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: GLOBALS_BINDING,
                resource: buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            buffer,
            layout,
            bind_group,
            _marker: PhantomData,
        })
    }

    /// Whole-block update.
    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    /// Write `bytes` at `offset` within the block.
    pub fn write_field(&self, queue: &wgpu::Queue, offset: u64, bytes: &[u8]) {
        queue.write_buffer(&self.buffer, offset, bytes);
    }

    /// Bind group layout (group 0 of every pipeline using this block).
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Bind group to set at group 0.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

impl GlobalsBlock<SceneGlobals> {
    /// Partial update of just the drag-delta scalars, so pointer moves do
    /// not rewrite the matrices.
    pub fn write_drag_delta(&self, queue: &wgpu::Queue, dx: f32, dy: f32) {
        self.write_field(
            queue,
            offset_of!(SceneGlobals, delta_x) as u64,
            bytemuck::bytes_of(&dx),
        );
        self.write_field(
            queue,
            offset_of!(SceneGlobals, delta_y) as u64,
            bytemuck::bytes_of(&dy),
        );
    }

    /// Partial update of the highlighted instance id.
    pub fn write_picked_id(&self, queue: &wgpu::Queue, id: i32) {
        self.write_field(
            queue,
            offset_of!(SceneGlobals, picked_instance_id) as u64,
            bytemuck::bytes_of(&id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_globals_matches_wgsl_layout() {
        // std140-style offsets of the WGSL struct.
        assert_eq!(offset_of!(SceneGlobals, time), 192);
        assert_eq!(offset_of!(SceneGlobals, picked_instance_id), 204);
        assert_eq!(offset_of!(SceneGlobals, color), 208);
        assert_eq!(offset_of!(SceneGlobals, bound_min), 224);
        assert_eq!(offset_of!(SceneGlobals, delta_x), 236);
        assert_eq!(offset_of!(SceneGlobals, bound_max), 240);
        assert_eq!(offset_of!(SceneGlobals, delta_y), 252);
        assert_eq!(offset_of!(SceneGlobals, view_pos), 256);
        assert_eq!(size_of::<SceneGlobals>(), 272);
    }

    #[test]
    fn partial_writes_are_aligned() {
        assert_eq!(offset_of!(SceneGlobals, delta_x) % 4, 0);
        assert_eq!(offset_of!(SceneGlobals, delta_y) % 4, 0);
    }

    #[test]
    fn time_wraps() {
        let mut g = SceneGlobals::default();
        g.advance_time(9.5);
        g.advance_time(1.0);
        assert!((g.time - 0.5).abs() < 1e-5);
    }

    #[test]
    fn schema_sizes() {
        assert_eq!(GlobalsSchema::Scene.size(), 272);
        assert_eq!(GlobalsSchema::Loading.size(), 16);
        assert_eq!(GlobalsSchema::None.size(), 0);
    }
}
