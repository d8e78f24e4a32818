//! Input plumbing: queue access and the per-frame drain.

use glam::Vec2;

use super::SceneRenderer;
use crate::input::{InputEvent, InputSender};
use crate::renderer::picking::PickResult;

impl SceneRenderer {
    /// A sender other threads can queue input through.
    pub fn input_sender(&self) -> InputSender {
        self.input_tx.clone()
    }

    /// Queue `event` for the next frame.
    pub fn handle_input(&self, event: InputEvent) -> bool {
        self.input_tx.send(event)
    }

    /// Apply every queued event in send order.
    ///
    /// Drags and picks take effect at their place in the batch, so a tap
    /// whose down, pick and up arrive in the same frame ends with nothing
    /// selected. Picks use the camera of the frame the user saw.
    pub(super) fn drain_input(&mut self) {
        let events: Vec<InputEvent> = self.input_rx.drain().collect();
        for event in events {
            self.interactor.handle_event(&mut self.camera, event);
            self.apply_drags();
            if let Some(pointer) = self.interactor.take_pick_request() {
                self.resolve_pick(pointer);
            }
        }
    }

    /// Accumulate drags the move callback produced into the selected
    /// instance's offset, scaled by the configured drag scale. The last
    /// drag is also written to the globals block for the shaders.
    fn apply_drags(&mut self) {
        let scale = self.options.input.drag_scale;
        let mut last_delta = None;
        while let Ok((id, delta)) = self.drag_rx.try_recv() {
            if delta == Vec2::ZERO {
                continue;
            }
            let _ = self
                .instances
                .apply_offset(&self.context.queue, id, delta * scale);
            last_delta = Some(delta);
        }
        if let Some(delta) = last_delta {
            self.globals_values.delta_x = delta.x;
            self.globals_values.delta_y = delta.y;
            self.globals
                .write_drag_delta(&self.context.queue, delta.x, delta.y);
        }
    }

    /// Pick under `pointer` and make the hit the interactor's selection.
    pub(super) fn resolve_pick(&mut self, pointer: Vec2) {
        let result = self.pick_at(pointer);
        self.interactor.set_last_picked(result.instance().unwrap_or(0));
        match result {
            PickResult::Instance(id) => log::debug!("picked instance {id}"),
            PickResult::Background => log::debug!("picked background"),
            PickResult::Unavailable => log::debug!("picking unavailable"),
        }
    }
}
