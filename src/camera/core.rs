//! Orbit state and projection math, free of any input or GPU concerns.

use glam::{Mat4, Vec3};

/// Smallest allowed distance from the target.
pub const MIN_DISTANCE: f32 = 0.1;
/// Largest allowed distance from the target.
pub const MAX_DISTANCE: f32 = 5000.0;
/// Pitch limit in degrees, short of the poles so the up vector stays
/// well defined.
pub const MAX_PITCH: f32 = 89.0;

/// Orbit parameters around a target point. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Point the camera looks at.
    pub target: Vec3,
    /// Distance from the target.
    pub distance: f32,
    /// Rotation about world Y.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
}

impl CameraState {
    /// Clamp pitch to ±[`MAX_PITCH`] and distance to
    /// [[`MIN_DISTANCE`], [`MAX_DISTANCE`]].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self
    }

    /// Eye position on the sphere around the target.
    pub fn eye(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.target
            + self.distance
                * Vec3::new(
                    pitch.cos() * yaw.sin(),
                    pitch.sin(),
                    pitch.cos() * yaw.cos(),
                )
    }

    /// Unit vector from the eye toward the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye()).normalize_or(Vec3::NEG_Z)
    }

    /// Screen-right direction in world space.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or(Vec3::X)
    }

    /// Screen-up direction in world space.
    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Move every field a fraction `t` of the way toward `goal`.
    #[must_use]
    pub fn lerp(&self, goal: &Self, t: f32) -> Self {
        Self {
            target: self.target.lerp(goal.target, t),
            distance: self.distance + (goal.distance - self.distance) * t,
            yaw: self.yaw + (goal.yaw - self.yaw) * t,
            pitch: self.pitch + (goal.pitch - self.pitch) * t,
        }
    }

    /// Right-handed look-at view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Projection {
    /// Projection matrix.
    pub fn matrix(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Update the aspect ratio for a `width` x `height` viewport. Ignores
    /// zero-sized dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(yaw: f32, pitch: f32) -> CameraState {
        CameraState {
            target: Vec3::ZERO,
            distance: 10.0,
            yaw,
            pitch,
        }
    }

    #[test]
    fn eye_at_zero_angles_is_on_positive_z() {
        let eye = state(0.0, 0.0).eye();
        assert!((eye - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn yaw_ninety_moves_eye_to_positive_x() {
        let eye = state(90.0, 0.0).eye();
        assert!((eye - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn basis_is_orthonormal() {
        let s = state(30.0, 20.0);
        let (f, r, u) = (s.forward(), s.right(), s.up());
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((u.length() - 1.0).abs() < 1e-5);
        assert!(u.y > 0.0);
    }

    #[test]
    fn clamp_limits_pitch_and_distance() {
        let s = CameraState {
            target: Vec3::ZERO,
            distance: 1e6,
            yaw: 0.0,
            pitch: 120.0,
        }
        .clamped();
        assert_eq!(s.pitch, MAX_PITCH);
        assert_eq!(s.distance, MAX_DISTANCE);
    }
}
