//! Render-target texture abstraction shared by the scene and picking
//! surfaces.

/// A render-target texture and its default view.
///
/// Owned exclusively by whichever surface created it. Not `Clone`; dropping
/// it releases the GPU texture.
pub struct RenderTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

/// Creation parameters for a [`RenderTarget`].
#[derive(Debug, Clone, Copy)]
pub struct TargetDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Texel format.
    pub format: wgpu::TextureFormat,
    /// MSAA sample count (1 for single-sample).
    pub sample_count: u32,
    /// Usage flags.
    pub usage: wgpu::TextureUsages,
}

impl RenderTarget {
    /// Create a new render-target texture.
    #[must_use]
    pub fn new(device: &wgpu::Device, desc: &TargetDesc<'_>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: desc.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}

/// Check that a `width` x `height` target fits the device limits.
///
/// # Errors
///
/// Returns a description of the problem for zero-sized or oversized
/// targets.
pub fn validate_extent(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> Result<(), String> {
    let max = device.limits().max_texture_dimension_2d;
    check_extent(width, height, max)
}

fn check_extent(width: u32, height: u32, max: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!("zero-sized target {width}x{height}"));
    }
    if width > max || height > max {
        return Err(format!(
            "target {width}x{height} exceeds device limit {max}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_extent() {
        assert!(check_extent(0, 10, 8192).is_err());
        assert!(check_extent(10, 0, 8192).is_err());
    }

    #[test]
    fn rejects_oversized_extent() {
        assert!(check_extent(8193, 10, 8192).is_err());
        assert!(check_extent(1, 1, 8192).is_ok());
        assert!(check_extent(8192, 8192, 8192).is_ok());
    }
}
