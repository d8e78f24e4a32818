//! Owned, deduplicating store of material textures.
//!
//! Textures are uploaded once per key (normally the source path) and shared
//! by every mesh that references the same key. The registry is created by
//! the renderer and passed by `&mut` to whatever uploads models; there is no
//! process-wide instance.

use rustc_hash::FxHashMap;

use crate::gpu::pipeline_helpers;
use crate::model::DecodedImage;

/// Handle to a texture held by a [`TextureRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

struct RegisteredTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Material texture store with load-once, share-by-key semantics.
pub struct TextureRegistry {
    by_key: FxHashMap<String, TextureId>,
    textures: Vec<RegisteredTexture>,
    fallback: TextureId,
    sampler: wgpu::Sampler,
}

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

impl TextureRegistry {
    /// Create a registry holding only the 1x1 white fallback texture.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = upload_rgba(device, queue, "Fallback White", 1, 1, &[255; 4]);
        Self {
            by_key: FxHashMap::default(),
            textures: vec![white],
            fallback: TextureId(0),
            sampler: pipeline_helpers::repeat_sampler(device, "Material Sampler"),
        }
    }

    /// Upload `image` unless a texture with the same key already exists.
    pub fn get_or_upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
    ) -> TextureId {
        if let Some(&id) = self.by_key.get(&image.key) {
            return id;
        }
        let texture = upload_rgba(
            device,
            queue,
            &image.key,
            image.width,
            image.height,
            &image.rgba,
        );
        self.insert(image.key.clone(), texture)
    }

    /// Handle for `key`, if it was uploaded.
    pub fn get(&self, key: &str) -> Option<TextureId> {
        self.by_key.get(key).copied()
    }

    /// View of texture `id`. Unknown ids resolve to the fallback.
    pub fn view(&self, id: TextureId) -> &wgpu::TextureView {
        let fallback = &self.textures[self.fallback.0 as usize];
        &self.textures.get(id.0 as usize).unwrap_or(fallback).view
    }

    /// The 1x1 white texture used for empty slots.
    pub fn fallback(&self) -> TextureId {
        self.fallback
    }

    /// Sampler shared by all material textures.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Number of keyed textures (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// `true` if no keyed texture has been uploaded.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn insert(&mut self, key: String, texture: RegisteredTexture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        let _ = self.by_key.insert(key, id);
        id
    }
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> RegisteredTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    RegisteredTexture {
        _texture: texture,
        view,
    }
}
