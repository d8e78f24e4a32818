use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Pointer and gesture sensitivity.
pub struct InputOptions {
    /// World units of instance offset per pixel of drag.
    pub drag_scale: f32,
    /// Zoom step per scroll unit: `zoom(1 + delta * step)`.
    pub scroll_zoom_step: f32,
    /// Two-finger rotation below this many radians per frame is ignored.
    pub twist_threshold: f32,
    /// Orbit degrees per degree of two-finger rotation.
    pub twist_orbit_scale: f32,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            drag_scale: 0.01,
            scroll_zoom_step: 0.1,
            twist_threshold: 0.01,
            twist_orbit_scale: 0.5,
        }
    }
}
