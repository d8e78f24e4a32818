//! Per-frame update, picking and rendering.

use glam::Vec2;

use super::SceneRenderer;
use crate::renderer::picking::{PickResult, PickScene};

impl SceneRenderer {
    /// Update and present one frame.
    ///
    /// # Errors
    ///
    /// Returns the surface error from [`render`](Self::render).
    pub fn frame(&mut self, dt: f32) -> Result<(), wgpu::SurfaceError> {
        self.update(dt);
        self.render()
    }

    /// Advance everything but drawing: apply queued input (including any
    /// picks it requests), upload a freshly loaded model, move the camera
    /// and refresh the globals.
    ///
    /// The first update after a model is installed also runs one pick at
    /// the last pointer position, so the pick path and highlight start in
    /// a known state.
    pub fn update(&mut self, dt: f32) {
        self.drain_input();
        self.poll_loader();

        self.camera.update(dt);
        self.globals_values.set_camera(
            self.camera.view_matrix(),
            self.camera.projection_matrix(),
            self.camera.eye(),
        );
        self.globals_values.advance_time(dt);
        self.globals.write(&self.context.queue, &self.globals_values);

        if self.model.is_none() {
            self.loading_view.update(&self.context.queue, dt);
        } else if std::mem::take(&mut self.first_pick_pending) {
            self.resolve_pick(self.interactor.last_pointer());
        }
    }

    /// Pick the instance under `pointer` (window pixels) with the current
    /// camera, and highlight it.
    ///
    /// With no model loaded the answer is [`PickResult::Background`];
    /// without a picking pass it is [`PickResult::Unavailable`].
    pub fn pick_at(&mut self, pointer: Vec2) -> PickResult {
        let picking = self.pipelines.as_ref().and_then(|p| p.picking.as_ref());
        let result = match (picking, &self.model) {
            (None, _) => PickResult::Unavailable,
            (Some(_), None) => PickResult::Background,
            (Some(picking), Some(model)) => picking.perform_pick(
                &self.context,
                &PickScene {
                    globals: self.globals.bind_group(),
                    model,
                    instances: &self.instances,
                },
                pointer,
            ),
        };

        let highlighted = result.instance().unwrap_or(0) as i32;
        self.globals_values.picked_instance_id = highlighted;
        self.globals
            .write_picked_id(&self.context.queue, highlighted);
        self.last_pick = result;
        result
    }

    /// Render and present to the window surface.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] when the swapchain texture cannot be
    /// acquired; callers treat `Outdated` and `Lost` as a resize.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to_view(&view);
        frame.present();
        let _ = self.frame_timing.end_frame();
        Ok(())
    }

    /// Render the scene into the frame target, resolve, and blit to
    /// `view`.
    pub fn render_to_view(&self, view: &wgpu::TextureView) {
        let mut encoder = self.context.create_encoder("Scene Encoder");
        {
            let mut pass = self.frame_target.begin_frame(&mut encoder);
            match (&self.pipelines, &self.model) {
                (Some(pipelines), Some(model)) => {
                    let globals = self.globals.bind_group();
                    pipelines
                        .scene
                        .draw(&mut pass, globals, model, &self.instances);
                    if let Some(axis) = &pipelines.axis {
                        axis.draw(&mut pass, globals);
                    }
                    if self.interactor.show_bounding_box() {
                        if let Some(bounding_box) = &pipelines.bounding_box {
                            bounding_box.draw(&mut pass, globals, &self.instances);
                        }
                    }
                }
                _ => self.loading_view.draw(&mut pass),
            }
            self.frame_target.end_frame(pass);
        }
        self.frame_target.draw_to_screen(&mut encoder, view);
        self.context.submit(encoder);
    }

    /// Resize every size-dependent resource. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.camera.resize(width, height);
        if let Err(e) =
            self.frame_target
                .resize(&self.context.device, width, height)
        {
            log::error!("frame target resize failed: {e}");
        }
        if let Some(picking) =
            self.pipelines.as_mut().and_then(|p| p.picking.as_mut())
        {
            picking.resize(&self.context.device, width, height);
        }
    }
}
