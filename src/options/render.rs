use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Frame target and presentation parameters.
pub struct RenderOptions {
    /// Upper bound on the MSAA sample count.
    pub msaa_samples: u32,
    /// Scene clear color (linear RGBA).
    pub clear_color: [f32; 4],
    /// Frame rate cap for the viewer loop (0 = uncapped).
    pub target_fps: u32,
    /// Draw the per-instance bounding boxes.
    pub show_bounding_box: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            target_fps: 60,
            show_bounding_box: false,
        }
    }
}

impl RenderOptions {
    /// Clear color as a wgpu color.
    pub fn clear_wgpu_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        }
    }
}
