//! Pointer and touch state machine.
//!
//! Decides whether an input gesture moves the camera, drags the selected
//! instance, or asks for a pick. Camera effects go through
//! [`CameraControl`]; instance drags go through a registered move callback
//! so the interactor never touches GPU state.

use std::f32::consts::PI;

use glam::Vec2;

use super::event::{InputEvent, PointerButton};
use crate::camera::controller::CameraControl;
use crate::options::InputOptions;

/// Coarse touch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    /// Nothing is pressed.
    #[default]
    None,
    /// One pointer or finger is down.
    SingleFinger,
    /// Two fingers are down.
    MultiFinger,
}

/// Receives `(instance id, pixel delta)` while a selected instance is
/// dragged.
pub type MoveCallback = Box<dyn FnMut(u32, Vec2)>;

/// Two-finger reference for incremental pinch and twist.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchBaseline {
    distance: f32,
    angle: f32,
}

/// Translates input events into camera calls, drags and pick requests.
pub struct Interactor {
    state: InteractionState,
    active_button: Option<PointerButton>,
    last_pointer: Vec2,
    last_picked_id: u32,
    baseline: Option<PinchBaseline>,
    pick_requested: bool,
    show_bounding_box: bool,
    on_move: Option<MoveCallback>,
    options: InputOptions,
}

impl Interactor {
    /// Idle interactor with nothing selected.
    pub fn new(options: InputOptions) -> Self {
        Self {
            state: InteractionState::None,
            active_button: None,
            last_pointer: Vec2::ZERO,
            last_picked_id: 0,
            baseline: None,
            pick_requested: false,
            show_bounding_box: false,
            on_move: None,
            options,
        }
    }

    /// Register the callback invoked while dragging a selected instance.
    pub fn set_move_callback(&mut self, callback: MoveCallback) {
        self.on_move = Some(callback);
    }

    /// Apply one queued event.
    pub fn handle_event(&mut self, camera: &mut impl CameraControl, event: InputEvent) {
        match event {
            InputEvent::PointerDown { x, y, button } => {
                self.on_pointer_down(x, y, button);
            }
            InputEvent::PointerMove { x, y } => self.on_pointer_move(camera, x, y),
            InputEvent::PointerUp => self.on_pointer_up(),
            InputEvent::Scroll { delta } => self.on_scroll(camera, delta),
            InputEvent::MultiTouch { x1, y1, x2, y2 } => {
                self.on_multi_touch(camera, Vec2::new(x1, y1), Vec2::new(x2, y2));
            }
            InputEvent::TouchStateChanged => self.on_touch_state_changed(),
            InputEvent::Scale { factor } => self.on_scale(camera, factor),
            InputEvent::RequestPick => self.request_pick(),
            InputEvent::ToggleBoundingBox => {
                self.show_bounding_box = !self.show_bounding_box;
            }
        }
    }

    /// Pointer pressed: remember where and with which button.
    pub fn on_pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        self.state = InteractionState::SingleFinger;
        self.active_button = Some(button);
        self.last_pointer = Vec2::new(x, y);
    }

    /// Pointer moved while pressed.
    ///
    /// Left drags orbit the camera, or drag the selected instance if there
    /// is one. Right and middle drags pan, but only with nothing selected.
    pub fn on_pointer_move(&mut self, camera: &mut impl CameraControl, x: f32, y: f32) {
        if self.state != InteractionState::SingleFinger {
            return;
        }
        let current = Vec2::new(x, y);
        let delta = current - self.last_pointer;
        let selected = self.last_picked_id != 0;

        match self.active_button {
            Some(PointerButton::Left) if selected => {
                if let Some(on_move) = self.on_move.as_mut() {
                    on_move(self.last_picked_id, delta);
                }
            }
            Some(PointerButton::Left) => camera.orbit(-delta.x, delta.y),
            Some(PointerButton::Right | PointerButton::Middle) if !selected => {
                camera.pan(delta.x, delta.y);
            }
            _ => {}
        }
        self.last_pointer = current;
    }

    /// Pointer released. Clears the selection; offsets are left alone.
    pub fn on_pointer_up(&mut self) {
        self.state = InteractionState::None;
        self.active_button = None;
        self.baseline = None;
        self.last_picked_id = 0;
    }

    /// Wheel scroll: `zoom(1 + delta * step)`.
    pub fn on_scroll(&mut self, camera: &mut impl CameraControl, delta: f32) {
        camera.zoom(1.0 + delta * self.options.scroll_zoom_step);
    }

    /// Two fingers down. The first frame only records a baseline; later
    /// frames zoom by the distance ratio and orbit by the twist angle,
    /// each relative to the previous frame.
    pub fn on_multi_touch(&mut self, camera: &mut impl CameraControl, a: Vec2, b: Vec2) {
        let offset = b - a;
        let current = PinchBaseline {
            distance: offset.length(),
            angle: offset.y.atan2(offset.x),
        };

        match self.baseline.filter(|_| self.state == InteractionState::MultiFinger) {
            None => self.state = InteractionState::MultiFinger,
            Some(previous) => {
                if previous.distance > 0.0 {
                    camera.zoom(current.distance / previous.distance);
                }
                let twist = wrap_angle(current.angle - previous.angle);
                if twist.abs() > self.options.twist_threshold {
                    camera.orbit(twist.to_degrees() * self.options.twist_orbit_scale, 0.0);
                }
            }
        }

        self.baseline = Some(current);
        self.last_pointer = (a + b) * 0.5;
    }

    /// The platform reported a change in touching fingers; the next
    /// two-finger frame starts a fresh gesture.
    pub fn on_touch_state_changed(&mut self) {
        self.baseline = None;
        if self.state == InteractionState::MultiFinger {
            self.state = InteractionState::None;
        }
    }

    /// Platform pinch gesture.
    pub fn on_scale(&mut self, camera: &mut impl CameraControl, factor: f32) {
        if factor > 0.0 {
            camera.zoom(factor);
        }
    }

    /// Ask for a pick at the last pointer position on the next frame.
    pub fn request_pick(&mut self) {
        self.pick_requested = true;
    }

    /// Consume a pending pick request, returning where to pick.
    pub fn take_pick_request(&mut self) -> Option<Vec2> {
        std::mem::take(&mut self.pick_requested).then_some(self.last_pointer)
    }

    /// Record the outcome of a pick; `0` means nothing is selected.
    pub fn set_last_picked(&mut self, id: u32) {
        self.last_picked_id = id;
    }

    /// Currently selected instance id (0 = none).
    pub fn last_picked(&self) -> u32 {
        self.last_picked_id
    }

    /// Current touch state.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Button held in the current single-pointer gesture.
    pub fn active_button(&self) -> Option<PointerButton> {
        self.active_button
    }

    /// Last pointer position (two-finger midpoint during pinches).
    pub fn last_pointer(&self) -> Vec2 {
        self.last_pointer
    }

    /// Whether the bounding-box overlay is toggled on.
    pub fn show_bounding_box(&self) -> bool {
        self.show_bounding_box
    }

    /// Force the bounding-box overlay state.
    pub fn set_show_bounding_box(&mut self, show: bool) {
        self.show_bounding_box = show;
    }
}

/// Fold an angle difference into `[-π, π]`.
fn wrap_angle(delta: f32) -> f32 {
    if delta > PI {
        delta - 2.0 * PI
    } else if delta < -PI {
        delta + 2.0 * PI
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::renderer::instances::OffsetTable;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Orbit(f32, f32),
        Pan(f32, f32),
        Zoom(f32),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl CameraControl for Recorder {
        fn orbit(&mut self, dx: f32, dy: f32) {
            self.calls.push(Call::Orbit(dx, dy));
        }
        fn pan(&mut self, dx: f32, dy: f32) {
            self.calls.push(Call::Pan(dx, dy));
        }
        fn zoom(&mut self, factor: f32) {
            self.calls.push(Call::Zoom(factor));
        }
    }

    fn interactor_with_moves() -> (Interactor, Rc<RefCell<Vec<(u32, Vec2)>>>) {
        let moves = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&moves);
        let mut interactor = Interactor::new(InputOptions::default());
        interactor.set_move_callback(Box::new(move |id, delta| {
            sink.borrow_mut().push((id, delta));
        }));
        (interactor, moves)
    }

    #[test]
    fn left_drag_without_selection_orbits() {
        let (mut it, moves) = interactor_with_moves();
        let mut cam = Recorder::default();
        it.on_pointer_down(100.0, 100.0, PointerButton::Left);
        it.on_pointer_move(&mut cam, 110.0, 100.0);
        assert_eq!(cam.calls, [Call::Orbit(-10.0, 0.0)]);
        assert!(moves.borrow().is_empty());
    }

    #[test]
    fn left_drag_with_selection_moves_instance() {
        let (mut it, moves) = interactor_with_moves();
        let mut cam = Recorder::default();
        it.on_pointer_down(0.0, 0.0, PointerButton::Left);
        it.set_last_picked(2);
        it.on_pointer_move(&mut cam, 5.0, -3.0);
        assert!(cam.calls.is_empty());
        assert_eq!(*moves.borrow(), [(2, Vec2::new(5.0, -3.0))]);
    }

    #[test]
    fn right_and_middle_drag_pan_only_without_selection() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_pointer_down(0.0, 0.0, PointerButton::Right);
        it.on_pointer_move(&mut cam, 4.0, 2.0);
        it.on_pointer_up();
        it.on_pointer_down(0.0, 0.0, PointerButton::Middle);
        it.set_last_picked(1);
        it.on_pointer_move(&mut cam, 4.0, 2.0);
        assert_eq!(cam.calls, [Call::Pan(4.0, 2.0)]);
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_pointer_move(&mut cam, 50.0, 50.0);
        assert!(cam.calls.is_empty());
    }

    #[test]
    fn deltas_are_incremental() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_pointer_down(0.0, 0.0, PointerButton::Left);
        it.on_pointer_move(&mut cam, 10.0, 0.0);
        it.on_pointer_move(&mut cam, 15.0, 5.0);
        assert_eq!(cam.calls, [Call::Orbit(-10.0, 0.0), Call::Orbit(-5.0, 5.0)]);
    }

    #[test]
    fn pointer_up_clears_selection_and_state() {
        let mut it = Interactor::new(InputOptions::default());
        it.on_pointer_down(0.0, 0.0, PointerButton::Left);
        it.set_last_picked(3);
        it.on_pointer_up();
        assert_eq!(it.last_picked(), 0);
        assert_eq!(it.state(), InteractionState::None);
        assert_eq!(it.active_button(), None);
    }

    #[test]
    fn pinch_zooms_from_second_frame() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_multi_touch(&mut cam, Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
        assert!(cam.calls.is_empty());
        assert_eq!(it.state(), InteractionState::MultiFinger);

        it.on_multi_touch(&mut cam, Vec2::new(0.0, 0.0), Vec2::new(150.0, 0.0));
        assert_eq!(cam.calls.len(), 1);
        match cam.calls[0] {
            Call::Zoom(f) => assert!((f - 1.5).abs() < 1e-5),
            ref other => panic!("expected zoom, got {other:?}"),
        }
    }

    #[test]
    fn twist_orbits_by_half_the_angle() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(100.0, 0.0));
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(0.0, 100.0));
        let orbit = cam
            .calls
            .iter()
            .find_map(|c| match c {
                Call::Orbit(dx, dy) => Some((*dx, *dy)),
                _ => None,
            })
            .unwrap();
        assert!((orbit.0 - 45.0).abs() < 1e-3);
        assert_eq!(orbit.1, 0.0);
    }

    #[test]
    fn tiny_twist_is_ignored() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(100.0, 0.0));
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(100.0, 0.5));
        assert!(cam.calls.iter().all(|c| matches!(c, Call::Zoom(_))));
    }

    #[test]
    fn twist_across_pi_takes_short_way() {
        assert!((wrap_angle(1.9 * PI) + 0.1 * PI).abs() < 1e-5);
        assert!((wrap_angle(-1.9 * PI) - 0.1 * PI).abs() < 1e-5);
        assert_eq!(wrap_angle(0.5), 0.5);
    }

    #[test]
    fn touch_state_change_resets_baseline() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(100.0, 0.0));
        it.on_touch_state_changed();
        assert_eq!(it.state(), InteractionState::None);
        it.on_multi_touch(&mut cam, Vec2::ZERO, Vec2::new(300.0, 0.0));
        assert!(cam.calls.is_empty());
    }

    #[test]
    fn scroll_and_scale_zoom() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.on_scroll(&mut cam, 1.0);
        it.on_scale(&mut cam, 0.0);
        it.on_scale(&mut cam, 2.0);
        assert_eq!(cam.calls.len(), 2);
        assert!(matches!(cam.calls[0], Call::Zoom(f) if (f - 1.1).abs() < 1e-6));
        assert_eq!(cam.calls[1], Call::Zoom(2.0));
    }

    #[test]
    fn pick_request_is_taken_once_at_last_pointer() {
        let mut it = Interactor::new(InputOptions::default());
        assert!(it.take_pick_request().is_none());
        it.on_pointer_down(12.0, 34.0, PointerButton::Left);
        it.request_pick();
        assert_eq!(it.take_pick_request(), Some(Vec2::new(12.0, 34.0)));
        assert!(it.take_pick_request().is_none());
    }

    #[test]
    fn offsets_persist_across_selections() {
        let table = Rc::new(RefCell::new(OffsetTable::new(4)));
        let sink = Rc::clone(&table);
        let mut it = Interactor::new(InputOptions::default());
        it.set_move_callback(Box::new(move |id, delta| {
            let _ = sink.borrow_mut().accumulate(id, delta * 0.01);
        }));
        let mut cam = Recorder::default();

        it.on_pointer_down(0.0, 0.0, PointerButton::Left);
        it.set_last_picked(1);
        it.on_pointer_move(&mut cam, 100.0, 0.0);
        it.on_pointer_up();

        it.on_pointer_down(0.0, 0.0, PointerButton::Left);
        it.set_last_picked(2);
        it.on_pointer_move(&mut cam, 0.0, 50.0);
        it.on_pointer_up();

        let table = table.borrow();
        assert!((table.get(1).unwrap().dx - 1.0).abs() < 1e-6);
        assert!((table.get(2).unwrap().dy - 0.5).abs() < 1e-6);
    }

    #[test]
    fn toggle_bounding_box_event() {
        let mut it = Interactor::new(InputOptions::default());
        let mut cam = Recorder::default();
        it.handle_event(&mut cam, InputEvent::ToggleBoundingBox);
        assert!(it.show_bounding_box());
        it.handle_event(&mut cam, InputEvent::ToggleBoundingBox);
        assert!(!it.show_bounding_box());
    }
}
