use std::fmt;

/// Errors that can occur during GPU context initialization.
#[derive(Debug)]
pub enum RenderContextError {
    /// Failed to create a wgpu surface from the window handle.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    AdapterRequest(wgpu::RequestAdapterError),
    /// GPU device request failed (limits or features not met).
    DeviceRequest(wgpu::RequestDeviceError),
    /// Surface configuration not supported by the selected adapter.
    UnsupportedSurface,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => {
                write!(f, "surface creation failed: {e}")
            }
            Self::AdapterRequest(e) => {
                write!(f, "no compatible GPU adapter found: {e}")
            }
            Self::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            Self::UnsupportedSurface => {
                write!(f, "surface configuration not supported by adapter")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedSurface => None,
        }
    }
}

/// Depth format shared by the scene and picking passes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Owns the core wgpu resources: device, queue, surface, and configuration.
pub struct RenderContext {
    /// The wgpu logical device.
    pub device: wgpu::Device,
    /// The wgpu command queue.
    pub queue: wgpu::Queue,
    /// The window surface for presentation (`None` in texture-only mode).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    /// MSAA sample count the scene target is built with.
    pub sample_count: u32,
}

impl RenderContext {
    /// Create a new render context from the given window surface target and
    /// initial size.
    ///
    /// `msaa_cap` bounds the scene sample count; the actual count is the
    /// largest one the adapter supports for both the surface format and
    /// [`DEPTH_FORMAT`].
    ///
    /// # Errors
    ///
    /// Returns `RenderContextError` if surface creation, adapter request,
    /// device request, or surface configuration fails.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        initial_size: (u32, u32),
        msaa_cap: u32,
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;

        let (device, queue) = request_device(&adapter).await?;

        let mut config = surface
            .get_default_config(&adapter, initial_size.0, initial_size.1)
            .ok_or(RenderContextError::UnsupportedSurface)?;
        config.width = initial_size.0.max(1);
        config.height = initial_size.1.max(1);
        config.present_mode = wgpu::PresentMode::Fifo;

        surface.configure(&device, &config);

        let sample_count = adapter_sample_count(&adapter, &device, config.format, msaa_cap);
        log::info!(
            "adapter: {}, surface format {:?}, msaa x{sample_count}",
            adapter.get_info().name,
            config.format
        );

        Ok(Self {
            device,
            queue,
            surface: Some(surface),
            config,
            sample_count,
        })
    }

    /// Create a surfaceless context rendering into textures of `format`.
    ///
    /// Used by tests and offscreen embedding; any adapter will do.
    ///
    /// # Errors
    ///
    /// Returns `RenderContextError` if no adapter or device is available.
    pub async fn headless(
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        msaa_cap: u32,
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: None,
                power_preference: wgpu::PowerPreference::LowPower,
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;

        let (device, queue) = request_device(&adapter).await?;
        let sample_count = adapter_sample_count(&adapter, &device, format, msaa_cap);

        let mut context = Self::from_device(device, queue, format, width, height);
        context.sample_count = sample_count;
        Ok(context)
    }

    /// Create a render context from an externally-owned device and queue
    /// (no surface, for texture-only / embedded rendering).
    ///
    /// Without an adapter to query, MSAA is off; call
    /// [`with_sample_count`](Self::with_sample_count) when the caller knows
    /// better.
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        Self {
            device,
            queue,
            surface: None,
            config,
            sample_count: 1,
        }
    }

    /// Override the MSAA sample count.
    #[must_use]
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count.max(1);
        self
    }

    /// The surface texture format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Reconfigure the surface for the new window size. Ignores zero-sized
    /// dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            if let Some(ref surface) = self.surface {
                surface.configure(&self.device, &self.config);
            }
        }
    }

    /// Acquire the next swapchain texture for rendering.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] if the surface is lost, outdated,
    /// or timed out, or if no surface is available (texture-only mode).
    pub fn get_next_frame(
        &self,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface
            .as_ref()
            .map_or(Err(wgpu::SurfaceError::Lost), |surface| {
                surface.get_current_texture()
            })
    }

    /// Create a new command encoder for recording GPU commands.
    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            })
    }

    /// Finish the encoder and submit its command buffer to the GPU queue.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}

async fn request_device(
    adapter: &wgpu::Adapter,
) -> Result<(wgpu::Device, wgpu::Queue), RenderContextError> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Primary Device"),
            required_features: adapter.features()
                & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await
        .map_err(RenderContextError::DeviceRequest)
}

/// Sample counts every device may use for any renderable format, with or
/// without adapter-specific format features.
const GUARANTEED_SAMPLE_COUNTS: [u32; 2] = [1, 4];

/// Largest sample count the device may use for both `format` and the
/// depth format, capped at `cap`.
fn adapter_sample_count(
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    cap: u32,
) -> u32 {
    let adapter_specific = device
        .features()
        .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
    let color = adapter
        .get_texture_format_features(format)
        .flags
        .supported_sample_counts();
    let depth = adapter
        .get_texture_format_features(DEPTH_FORMAT)
        .flags
        .supported_sample_counts();
    pick_sample_count(&legal_sample_counts(adapter_specific, &color, &depth), cap)
}

/// Counts usable for both the colour and depth attachments. Without
/// adapter-specific format features the device only accepts the
/// guaranteed counts, whatever the adapter reports.
fn legal_sample_counts(
    adapter_specific: bool,
    color: &[u32],
    depth: &[u32],
) -> Vec<u32> {
    color
        .iter()
        .copied()
        .filter(|c| depth.contains(c))
        .filter(|c| adapter_specific || GUARANTEED_SAMPLE_COUNTS.contains(c))
        .collect()
}

/// `min(max supported, cap)`, snapped down to a count the driver reports.
/// Always at least 1.
pub fn pick_sample_count(supported: &[u32], cap: u32) -> u32 {
    supported
        .iter()
        .copied()
        .filter(|&count| count <= cap.max(1))
        .max()
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_respects_cap() {
        assert_eq!(pick_sample_count(&[1, 2, 4, 8], 4), 4);
        assert_eq!(pick_sample_count(&[1, 2, 4, 8], 16), 8);
    }

    #[test]
    fn sample_count_snaps_to_supported() {
        // Cap of 3 is not a real count; fall back to the next one down.
        assert_eq!(pick_sample_count(&[1, 4], 3), 1);
        assert_eq!(pick_sample_count(&[1, 2, 4], 3), 2);
    }

    #[test]
    fn adapter_only_counts_need_the_feature() {
        let color = [1, 2, 4, 8, 16];
        let depth = [1, 2, 4, 8];
        let plain = legal_sample_counts(false, &color, &depth);
        assert_eq!(plain, [1, 4]);
        assert_eq!(pick_sample_count(&plain, 8), 4);
        assert_eq!(pick_sample_count(&plain, 2), 1);

        let extended = legal_sample_counts(true, &color, &depth);
        assert_eq!(extended, [1, 2, 4, 8]);
        assert_eq!(pick_sample_count(&extended, 8), 8);
    }

    #[test]
    fn sample_count_never_zero() {
        assert_eq!(pick_sample_count(&[], 4), 1);
        assert_eq!(pick_sample_count(&[1, 4], 0), 1);
    }
}
