use crate::error::ViewerError;
use crate::gpu::render_context::DEPTH_FORMAT;
use crate::gpu::texture::{validate_extent, RenderTarget, TargetDesc};

/// Color format of the pick surface: one instance id per texel.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// Offscreen R32Uint id target plus its depth buffer.
pub struct PickSurface {
    color: RenderTarget,
    depth: RenderTarget,
}

impl PickSurface {
    /// Create a `width` x `height` pick surface.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::FrameTarget`] for a zero-sized extent or one
    /// beyond the device limit.
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Self, ViewerError> {
        validate_extent(device, width, height)
            .map_err(|e| ViewerError::FrameTarget(format!("pick surface: {e}")))?;
        let color = RenderTarget::new(
            device,
            &TargetDesc {
                label: "Picking Texture",
                width,
                height,
                format: PICK_FORMAT,
                sample_count: 1,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC,
            },
        );
        let depth = RenderTarget::new(
            device,
            &TargetDesc {
                label: "Picking Depth Texture",
                width,
                height,
                format: DEPTH_FORMAT,
                sample_count: 1,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            },
        );
        Ok(Self { color, depth })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.color.height()
    }

    pub(super) fn color(&self) -> &RenderTarget {
        &self.color
    }

    pub(super) fn depth(&self) -> &RenderTarget {
        &self.depth
    }
}

pub(super) fn in_bounds(x: f32, y: f32, width: u32, height: u32) -> bool {
    x >= 0.0 && y >= 0.0 && x < width as f32 && y < height as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_half_open() {
        assert!(in_bounds(0.0, 0.0, 800, 600));
        assert!(in_bounds(799.5, 599.5, 800, 600));
        assert!(!in_bounds(800.0, 10.0, 800, 600));
        assert!(!in_bounds(10.0, 600.0, 800, 600));
        assert!(!in_bounds(-0.5, 10.0, 800, 600));
        assert!(!in_bounds(f32::NAN, 10.0, 800, 600));
    }
}
