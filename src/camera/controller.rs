//! The orbit camera driven by input, with optional damping toward the
//! input state.

use glam::{Mat4, Vec3};

use crate::camera::core::{CameraState, Projection};
use crate::options::CameraOptions;

/// The camera operations input handling drives.
///
/// Implemented by [`OrbitCamera`]; tests substitute a recorder.
pub trait CameraControl {
    /// Rotate by `dx` / `dy` input units.
    fn orbit(&mut self, dx: f32, dy: f32);
    /// Move the target by `dx` / `dy` pixels in screen space.
    fn pan(&mut self, dx: f32, dy: f32);
    /// Divide the distance by `factor`. Non-positive factors are ignored.
    fn zoom(&mut self, factor: f32);
}

/// Orbit camera with an input ("raw") state and a rendered ("actual")
/// state.
///
/// Input mutates the raw state; [`update`](Self::update) moves the actual
/// state toward it, either immediately or with exponential damping.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    raw: CameraState,
    actual: CameraState,
    projection: Projection,
    orbit_speed: f32,
    pan_speed: f32,
    damping: Option<f32>,
}

impl OrbitCamera {
    /// Create a camera looking at the origin from the configured angles.
    pub fn new(options: &CameraOptions, width: u32, height: u32) -> Self {
        let initial = CameraState {
            target: Vec3::ZERO,
            distance: options.distance,
            yaw: options.yaw,
            pitch: options.pitch,
        }
        .clamped();
        let mut projection = Projection {
            fovy: options.fovy,
            aspect: 1.0,
            znear: options.znear,
            zfar: options.zfar,
        };
        projection.resize(width, height);
        Self {
            raw: initial,
            actual: initial,
            projection,
            orbit_speed: options.orbit_speed,
            pan_speed: options.pan_speed,
            damping: options.damping.then_some(options.damping_factor),
        }
    }

    /// Advance the rendered state by `dt` seconds.
    ///
    /// With damping the actual state closes `1 - damping^dt` of the gap to
    /// the raw state; without it the raw state is copied.
    pub fn update(&mut self, dt: f32) {
        self.actual = match self.damping {
            Some(damping) => {
                let t = 1.0 - damping.powf(dt.max(0.0));
                self.actual.lerp(&self.raw, t.clamp(0.0, 1.0)).clamped()
            }
            None => self.raw,
        };
    }

    /// Enable damping with `factor`, or disable it with `None`.
    pub fn set_damping(&mut self, factor: Option<f32>) {
        self.damping = factor;
    }

    /// Update the aspect ratio for a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    /// Replace the raw target, e.g. to recentre on a newly loaded model.
    pub fn set_target(&mut self, target: Vec3) {
        self.raw.target = target;
    }

    /// Set the raw distance (clamped).
    pub fn set_distance(&mut self, distance: f32) {
        self.raw.distance = distance;
        self.raw = self.raw.clamped();
    }

    /// Input state.
    pub fn raw(&self) -> &CameraState {
        &self.raw
    }

    /// Rendered state.
    pub fn actual(&self) -> &CameraState {
        &self.actual
    }

    /// View matrix from the actual state.
    pub fn view_matrix(&self) -> Mat4 {
        self.actual.view_matrix()
    }

    /// Projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Eye position from the actual state.
    pub fn eye(&self) -> Vec3 {
        self.actual.eye()
    }
}

impl CameraControl for OrbitCamera {
    fn orbit(&mut self, dx: f32, dy: f32) {
        self.raw.yaw += dx * self.orbit_speed;
        self.raw.pitch += dy * self.orbit_speed;
        self.raw = self.raw.clamped();
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        let scale = self.pan_speed * self.actual.distance;
        let right = self.actual.right();
        let up = self.actual.up();
        self.raw.target += -right * dx * scale + up * dy * scale;
    }

    fn zoom(&mut self, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            log::warn!("ignoring zoom factor {factor}");
            return;
        }
        self.raw.distance /= factor;
        self.raw = self.raw.clamped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::core::{MAX_DISTANCE, MAX_PITCH, MIN_DISTANCE};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(&CameraOptions::default(), 800, 600)
    }

    #[test]
    fn starts_at_configured_angles() {
        let cam = camera();
        assert_eq!(cam.raw().pitch, 15.0);
        assert_eq!(cam.raw().distance, 10.0);
        assert_eq!(cam.raw(), cam.actual());
    }

    #[test]
    fn orbit_scales_by_speed_and_clamps_pitch() {
        let mut cam = camera();
        cam.orbit(-10.0, 0.0);
        assert!((cam.raw().yaw + 2.5).abs() < 1e-6);
        cam.orbit(0.0, 10_000.0);
        assert_eq!(cam.raw().pitch, MAX_PITCH);
        cam.orbit(0.0, -100_000.0);
        assert_eq!(cam.raw().pitch, -MAX_PITCH);
    }

    #[test]
    fn zoom_divides_and_clamps_distance() {
        let mut cam = camera();
        cam.zoom(2.0);
        assert!((cam.raw().distance - 5.0).abs() < 1e-6);
        cam.zoom(1e6);
        assert_eq!(cam.raw().distance, MIN_DISTANCE);
        cam.zoom(1e-9);
        assert_eq!(cam.raw().distance, MAX_DISTANCE);
    }

    #[test]
    fn non_positive_zoom_is_ignored() {
        let mut cam = camera();
        cam.zoom(0.0);
        cam.zoom(-3.0);
        assert_eq!(cam.raw().distance, 10.0);
    }

    #[test]
    fn pan_moves_target_along_screen_axes() {
        let mut cam = OrbitCamera::new(
            &CameraOptions {
                pitch: 0.0,
                ..CameraOptions::default()
            },
            800,
            600,
        );
        cam.pan(10.0, 0.0);
        // Looking down -Z, right is +X, so a positive dx moves target -X.
        let target = cam.raw().target;
        assert!((target.x + 10.0 * 0.01 * 10.0).abs() < 1e-5);
        assert!(target.y.abs() < 1e-5);
        cam.pan(0.0, 10.0);
        assert!((cam.raw().target.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn without_damping_update_copies_raw() {
        let mut cam = camera();
        cam.orbit(40.0, 8.0);
        cam.update(0.016);
        assert_eq!(cam.raw(), cam.actual());
    }

    #[test]
    fn damping_converges_and_respects_clamps() {
        let mut cam = camera();
        cam.set_damping(Some(0.15));
        cam.orbit(0.0, 10_000.0);
        cam.zoom(1e-9);

        cam.update(0.016);
        assert!(cam.actual().pitch < cam.raw().pitch);

        for _ in 0..2000 {
            cam.update(0.016);
        }
        let (raw, actual) = (cam.raw(), cam.actual());
        assert!((actual.pitch - raw.pitch).abs() < 1e-3);
        assert!(actual.pitch <= MAX_PITCH && raw.pitch <= MAX_PITCH);
        assert!(actual.distance <= MAX_DISTANCE && raw.distance <= MAX_DISTANCE);
    }

    #[test]
    fn damping_fraction_follows_power_law() {
        let mut cam = camera();
        cam.set_damping(Some(0.25));
        cam.orbit(40.0, 0.0); // yaw goal 10
        cam.update(1.0);
        // One second closes 1 - 0.25 = 75% of the gap.
        assert!((cam.actual().yaw - 7.5).abs() < 1e-4);
    }
}
