use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Camera projection and control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
    /// Degrees of yaw/pitch per unit of orbit input.
    pub orbit_speed: f32,
    /// Target movement per pixel, scaled by distance.
    pub pan_speed: f32,
    /// Smooth the rendered state toward the input state.
    pub damping: bool,
    /// Fraction of the remaining gap left after one second of damping.
    pub damping_factor: f32,
    /// Initial yaw in degrees.
    pub yaw: f32,
    /// Initial pitch in degrees.
    pub pitch: f32,
    /// Initial distance from the target.
    pub distance: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 5000.0,
            orbit_speed: 0.25,
            pan_speed: 0.01,
            damping: false,
            damping_factor: 0.15,
            yaw: 0.0,
            pitch: 15.0,
            distance: 10.0,
        }
    }
}
