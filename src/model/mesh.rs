//! CPU-side model data: vertices, indices, texture references and decoded
//! images. Nothing here touches wgpu, so it can be built on the loader
//! thread.

use std::path::{Path, PathBuf};

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::error::ViewerError;
use crate::gpu::material::TextureRole;

/// Per-vertex data for model meshes.
///
/// `tex_coords.x` doubles as the vertex's movement weight when an instance
/// is dragged.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Model-space normal.
    pub normal: [f32; 3],
    /// Texture coordinates (v flipped to top-left origin).
    pub tex_coords: [f32; 2],
}

impl Vertex {
    /// Vertex buffer layout: locations 0 (position), 1 (normal), 2 (uv).
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0, // position
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1, // normal
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 24,
                    shader_location: 2, // tex_coords
                },
            ],
        }
    }
}

/// A texture used by a mesh, by role and registry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    /// What the texture is for.
    pub role: TextureRole,
    /// Registry key (the resolved file path).
    pub key: String,
}

/// One mesh of a model.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Name from the source file.
    pub name: String,
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
    /// Textures in encounter order.
    pub textures: Vec<TextureRef>,
}

/// An image decoded to tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Registry key (the file path).
    pub key: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Decode the image file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ModelLoad`] if the file cannot be read or
    /// decoded.
    pub fn open(path: &Path) -> Result<Self, ViewerError> {
        let image = image::open(path).map_err(|e| {
            ViewerError::ModelLoad(format!("{}: {e}", path.display()))
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            key: path.to_string_lossy().into_owned(),
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// A parsed model ready for GPU upload.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Meshes in file order.
    pub meshes: Vec<MeshData>,
    /// Decoded images, keyed like [`TextureRef::key`].
    pub images: Vec<DecodedImage>,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl ModelData {
    /// Assemble a model from meshes and compute its bounds.
    pub fn from_meshes(meshes: Vec<MeshData>, images: Vec<DecodedImage>) -> Self {
        let (bounds_min, bounds_max) = compute_bounds(&meshes);
        Self {
            meshes,
            images,
            bounds_min,
            bounds_max,
        }
    }

    /// Parse a Wavefront OBJ file and decode the textures its materials
    /// reference.
    ///
    /// Texture paths are resolved relative to the OBJ file. A texture that
    /// fails to decode is logged and left to the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ModelLoad`] if the OBJ cannot be parsed or has
    /// no geometry.
    pub fn load_obj(path: &Path) -> Result<Self, ViewerError> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &options).map_err(|e| {
            ViewerError::ModelLoad(format!("{}: {e}", path.display()))
        })?;
        let materials = materials.unwrap_or_else(|e| {
            log::warn!("{}: materials unavailable: {e}", path.display());
            Vec::new()
        });

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut images: FxHashMap<String, DecodedImage> = FxHashMap::default();
        let mut meshes = Vec::with_capacity(models.len());

        for model in models {
            let mesh = &model.mesh;
            if mesh.positions.is_empty() || mesh.indices.is_empty() {
                continue;
            }
            let textures = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(|material| material_textures(material, &base_dir))
                .unwrap_or_default();

            for texture in &textures {
                if images.contains_key(&texture.key) {
                    continue;
                }
                match DecodedImage::open(Path::new(&texture.key)) {
                    Ok(image) => {
                        let _ = images.insert(texture.key.clone(), image);
                    }
                    Err(e) => log::warn!("texture skipped: {e}"),
                }
            }

            meshes.push(MeshData {
                name: model.name.clone(),
                vertices: build_vertices(
                    &mesh.positions,
                    &mesh.normals,
                    &mesh.texcoords,
                    &mesh.indices,
                ),
                indices: mesh.indices.clone(),
                textures,
            });
        }

        if meshes.is_empty() {
            return Err(ViewerError::ModelLoad(format!(
                "{}: no triangle meshes",
                path.display()
            )));
        }

        log::info!(
            "parsed {}: {} meshes, {} textures",
            path.display(),
            meshes.len(),
            images.len()
        );
        Ok(Self::from_meshes(meshes, images.into_values().collect()))
    }

    /// Built-in unit cube centred on the origin.
    ///
    /// Each face has its own four vertices so the `u` coordinate (the drag
    /// weight) runs 0 to 1 across every face.
    pub fn unit_cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u axis, v axis
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in FACES {
            let n = Vec3::from(normal);
            let u = Vec3::from(u_axis);
            let v = Vec3::from(v_axis);
            let base = vertices.len() as u32;
            for (su, sv) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let position =
                    0.5 * n + (su - 0.5) * u + (sv - 0.5) * v;
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal,
                    tex_coords: [su, 1.0 - sv],
                });
            }
            indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }
        Self::from_meshes(
            vec![MeshData {
                name: "cube".to_owned(),
                vertices,
                indices,
                textures: Vec::new(),
            }],
            Vec::new(),
        )
    }

    /// Model-space bounding box minimum.
    pub fn bounds_min(&self) -> Vec3 {
        self.bounds_min
    }

    /// Model-space bounding box maximum.
    pub fn bounds_max(&self) -> Vec3 {
        self.bounds_max
    }

    /// Extent along X.
    pub fn width(&self) -> f32 {
        self.bounds_max.x - self.bounds_min.x
    }

    /// Total vertex count over all meshes.
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }
}

fn material_textures(material: &tobj::Material, base_dir: &Path) -> Vec<TextureRef> {
    let entries = [
        (TextureRole::Diffuse, &material.diffuse_texture),
        (TextureRole::Specular, &material.specular_texture),
        (TextureRole::Normal, &material.normal_texture),
        (TextureRole::Ambient, &material.ambient_texture),
    ];
    entries
        .into_iter()
        .filter_map(|(role, name)| {
            let name = name.as_deref()?.trim();
            if name.is_empty() {
                return None;
            }
            let resolved: PathBuf = base_dir.join(name);
            Some(TextureRef {
                role,
                key: resolved.to_string_lossy().into_owned(),
            })
        })
        .collect()
}

/// Interleave tobj's flat arrays. Missing normals are generated by
/// averaging the adjacent face normals; missing uvs become zero.
fn build_vertices(
    positions: &[f32],
    normals: &[f32],
    texcoords: &[f32],
    indices: &[u32],
) -> Vec<Vertex> {
    let count = positions.len() / 3;
    let smooth = if normals.len() == positions.len() {
        None
    } else {
        Some(smooth_normals(positions, indices))
    };

    (0..count)
        .map(|i| {
            let position = [positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]];
            let normal = match &smooth {
                Some(generated) => generated[i].to_array(),
                None => [normals[3 * i], normals[3 * i + 1], normals[3 * i + 2]],
            };
            let tex_coords = if texcoords.len() >= 2 * (i + 1) {
                [texcoords[2 * i], 1.0 - texcoords[2 * i + 1]]
            } else {
                [0.0, 0.0]
            };
            Vertex {
                position,
                normal,
                tex_coords,
            }
        })
        .collect()
}

fn smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<Vec3> {
    let point = |i: u32| {
        let i = i as usize * 3;
        Vec3::new(positions[i], positions[i + 1], positions[i + 2])
    };
    let mut accumulated = vec![Vec3::ZERO; positions.len() / 3];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let face = (point(b) - point(a)).cross(point(c) - point(a));
        for index in [a, b, c] {
            if let Some(n) = accumulated.get_mut(index as usize) {
                *n += face;
            }
        }
    }
    accumulated
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

fn compute_bounds(meshes: &[MeshData]) -> (Vec3, Vec3) {
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for vertex in meshes.iter().flat_map(|m| &m.vertices) {
        let p = Vec3::from(vertex.position);
        min = min.min(p);
        max = max.max(p);
    }
    if min.cmpgt(max).any() {
        (Vec3::ZERO, Vec3::ZERO)
    } else {
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_bounds() {
        let cube = ModelData::unit_cube();
        assert_eq!(cube.bounds_min(), Vec3::splat(-0.5));
        assert_eq!(cube.bounds_max(), Vec3::splat(0.5));
        assert!((cube.width() - 1.0).abs() < 1e-6);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.meshes[0].indices.len(), 36);
    }

    #[test]
    fn cube_weights_span_zero_to_one() {
        let cube = ModelData::unit_cube();
        let weights: Vec<f32> =
            cube.meshes[0].vertices.iter().map(|v| v.tex_coords[0]).collect();
        assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
        assert!(weights.contains(&0.0));
        assert!(weights.contains(&1.0));
    }

    #[test]
    fn empty_model_has_zero_bounds() {
        let model = ModelData::from_meshes(Vec::new(), Vec::new());
        assert_eq!(model.bounds_min(), Vec3::ZERO);
        assert_eq!(model.width(), 0.0);
    }

    #[test]
    fn missing_normals_are_generated() {
        // One triangle in the XY plane, counter-clockwise.
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let vertices = build_vertices(&positions, &[], &[], &[0, 1, 2]);
        for v in &vertices {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 1e-6);
            assert_eq!(v.tex_coords, [0.0, 0.0]);
        }
    }

    #[test]
    fn v_coordinate_is_flipped() {
        let positions = [0.0; 3];
        let vertices = build_vertices(&positions, &[0.0, 0.0, 1.0], &[0.25, 0.2], &[]);
        assert_eq!(vertices[0].tex_coords[0], 0.25);
        assert!((vertices[0].tex_coords[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn load_obj_rejects_missing_file() {
        let err = ModelData::load_obj(Path::new("/nonexistent/model.obj"));
        assert!(matches!(err, Err(ViewerError::ModelLoad(_))));
    }
}
