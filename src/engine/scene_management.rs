//! Model loading, upload and camera framing.

use std::path::Path;

use glam::Vec3;

use super::SceneRenderer;
use crate::error::ViewerError;
use crate::model::{GpuModel, ModelData};
use crate::renderer::axis::axis_length;
use crate::renderer::instances::LayoutPolicy;

impl SceneRenderer {
    /// Start loading an OBJ file.
    ///
    /// Small files parse immediately; large ones parse on the loader
    /// thread. Either way the model is uploaded on the next frame, and the
    /// loading view is shown until then.
    ///
    /// # Errors
    ///
    /// Returns the stat or spawn error, or the parse error of a small
    /// file.
    pub fn load_model(&mut self, path: &Path) -> Result<(), ViewerError> {
        self.loading_view.reset();
        self.loader.load(path)
    }

    /// Replace the current model with already-parsed data.
    pub fn set_model(&mut self, data: &ModelData) {
        let Some(pipelines) = &self.pipelines else {
            log::warn!("no scene pipelines; model {} meshes ignored", data.meshes.len());
            return;
        };
        let model = GpuModel::upload(
            &self.context.device,
            &self.context.queue,
            data,
            &mut self.registry,
            pipelines.scene.slots(),
            pipelines.scene.material_layout(),
        );

        let (min, max) = (model.bounds_min(), model.bounds_max());
        let policy = self.options.scene.layout;
        let count = self.options.scene.instance_count;
        self.instances.configure(
            &self.context.device,
            &self.context.queue,
            &policy,
            count,
            min,
            max,
        );
        self.instances.upload_offsets(&self.context.queue);
        if let Some(axis) = &pipelines.axis {
            axis.set_length(&self.context.queue, axis_length(min, max));
        }
        if let Some(bounding_box) = &pipelines.bounding_box {
            bounding_box.fit_model_box(&self.context.queue, &self.instances);
        }

        self.globals_values.set_bounds(min, max);
        self.globals_values.picked_instance_id = 0;
        self.interactor.set_last_picked(0);
        self.first_pick_pending = true;

        let extent = layout_extent(&policy, count, min, max);
        self.camera.set_target(Vec3::ZERO);
        self.camera
            .set_distance(fit_distance(extent, self.options.camera.fovy));

        log::info!(
            "model ready: {} meshes, {} instances",
            model.mesh_count(),
            self.instances.count()
        );
        self.model = Some(model);
    }

    /// Upload a model the loader finished since the last frame.
    pub(super) fn poll_loader(&mut self) {
        if let Some(data) = self.loader.take() {
            self.set_model(&data);
        }
    }
}

/// World-space size of the whole row of instances.
fn layout_extent(policy: &LayoutPolicy, count: u32, min: Vec3, max: Vec3) -> Vec3 {
    let size = (max - min) * policy.scale;
    let slots = count.saturating_sub(1) as f32;
    Vec3::new(size.x + slots * size.x * policy.spacing, size.y, size.z)
}

/// Distance at which a sphere around `extent` fills the vertical field of
/// view.
fn fit_distance(extent: Vec3, fovy_degrees: f32) -> f32 {
    let radius = extent.length() * 0.5;
    let half_fov = (fovy_degrees.to_radians() * 0.5).max(1e-3);
    radius / half_fov.sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_covers_every_slot() {
        let policy = LayoutPolicy {
            scale: 1.0,
            spacing: 1.0,
        };
        let e = layout_extent(&policy, 4, Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(e, Vec3::new(8.0, 1.0, 1.0));
        let single = layout_extent(&policy, 1, Vec3::ZERO, Vec3::ONE);
        assert_eq!(single, Vec3::ONE);
    }

    #[test]
    fn fit_distance_grows_with_extent() {
        let near = fit_distance(Vec3::ONE, 45.0);
        let far = fit_distance(Vec3::splat(10.0), 45.0);
        assert!(far > near);
        // 90 degree fov: distance = radius / sin(45°).
        let d = fit_distance(Vec3::new(2.0, 0.0, 0.0), 90.0);
        assert!((d - 1.0 / std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }
}
