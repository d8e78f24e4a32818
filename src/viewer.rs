//! Standalone viewer window backed by winit.
//!
//! ```no_run
//! # use instaview::Viewer;
//! Viewer::builder()
//!     .with_path("assets/models/tree.obj")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use rustc_hash::FxHashMap;
use winit::{
    application::ApplicationHandler,
    event::{
        ElementState, MouseScrollDelta, Touch, TouchPhase, WindowEvent,
    },
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    error::ViewerError, options::Options, InputEvent, PointerButton,
    SceneRenderer,
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    path: Option<PathBuf>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            path: None,
            options: None,
            title: "instaview".into(),
        }
    }

    /// Set the OBJ file to load. Without one, a unit cube is shown.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            path: self.path,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window showing the instanced model.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    path: Option<PathBuf>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Viewer`] if the event loop cannot be created
    /// or fails while running.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop =
            EventLoop::new().map_err(|e| ViewerError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            last_frame_time: Instant::now(),
            cursor: Vec2::ZERO,
            touches: TouchTracker::default(),
            path: self.path,
            options: self.options,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| ViewerError::Viewer(e.to_string()))
    }
}

// ── Touch tracking ───────────────────────────────────────────────────────

/// Active touch points, turned into single-pointer or two-finger events.
#[derive(Default)]
struct TouchTracker {
    points: FxHashMap<u64, Vec2>,
}

impl TouchTracker {
    /// Events produced by one winit touch update.
    fn update(&mut self, touch: &Touch) -> Vec<InputEvent> {
        let position =
            Vec2::new(touch.location.x as f32, touch.location.y as f32);
        let before = self.points.len();
        match touch.phase {
            TouchPhase::Started | TouchPhase::Moved => {
                let _ = self.points.insert(touch.id, position);
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let _ = self.points.remove(&touch.id);
            }
        }
        let after = self.points.len();

        let mut events = Vec::new();
        if before != after && (before >= 2 || after >= 2) {
            events.push(InputEvent::TouchStateChanged);
        }
        match (touch.phase, after) {
            (TouchPhase::Started, 1) => {
                events.push(InputEvent::PointerDown {
                    x: position.x,
                    y: position.y,
                    button: PointerButton::Left,
                });
                events.push(InputEvent::RequestPick);
            }
            (TouchPhase::Moved, 1) => events.push(InputEvent::PointerMove {
                x: position.x,
                y: position.y,
            }),
            (TouchPhase::Ended | TouchPhase::Cancelled, 0) => {
                events.push(InputEvent::PointerUp);
            }
            (_, n) if n >= 2 => {
                let mut ids: Vec<u64> = self.points.keys().copied().collect();
                ids.sort_unstable();
                let (a, b) = (self.points[&ids[0]], self.points[&ids[1]]);
                events.push(InputEvent::MultiTouch {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                });
            }
            _ => {}
        }
        events
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<SceneRenderer>,
    last_frame_time: Instant,
    cursor: Vec2,
    touches: TouchTracker,
    path: Option<PathBuf>,
    options: Options,
    title: String,
}

/// The wgpu surface always covers the whole window.
fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ViewerApp {
    fn send(&self, event: InputEvent) {
        if let Some(engine) = &self.engine {
            let _ = engine.handle_input(event);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        let Some(engine) = &mut self.engine else {
            return;
        };
        match engine.frame(dt) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                if let Some(w) = &self.window {
                    let (vp_w, vp_h) = viewport_size(w.inner_size());
                    engine.resize(vp_w, vp_h);
                }
            }
            Err(e) => log::error!("render error: {e:?}"),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = viewport_size(window.inner_size());
        let mut engine = match pollster::block_on(SceneRenderer::new(
            window.clone(),
            size,
            self.options.clone(),
        )) {
            Ok(e) => e,
            Err(e) => {
                log::error!("Failed to initialize renderer: {e}");
                event_loop.exit();
                return;
            }
        };

        match &self.path {
            Some(path) => {
                if let Err(e) = engine.load_model(path) {
                    log::error!("failed to load {}: {e}", path.display());
                }
            }
            None => engine.set_model(&crate::model::ModelData::unit_cube()),
        }

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        if self.window.is_none() || self.engine.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(event_size) => {
                let (vp_w, vp_h) = viewport_size(event_size);
                if let Some(engine) = &mut self.engine {
                    engine.resize(vp_w, vp_h);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput { button, state, .. } => {
                let Some(button) = PointerButton::from_winit(button) else {
                    return;
                };
                if state == ElementState::Pressed {
                    self.send(InputEvent::PointerDown {
                        x: self.cursor.x,
                        y: self.cursor.y,
                        button,
                    });
                    if button == PointerButton::Left {
                        self.send(InputEvent::RequestPick);
                    }
                } else {
                    self.send(InputEvent::PointerUp);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.send(InputEvent::PointerMove {
                    x: self.cursor.x,
                    y: self.cursor.y,
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
                };
                self.send(InputEvent::Scroll { delta });
            }

            WindowEvent::Touch(touch) => {
                for event in self.touches.update(&touch) {
                    self.send(event);
                }
            }

            WindowEvent::PinchGesture { delta, .. } => {
                self.send(InputEvent::Scale {
                    factor: 1.0 + delta as f32,
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyB) => {
                        self.send(InputEvent::ToggleBoundingBox);
                    }
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => {}
                }
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(engine)) = (&self.window, &self.engine) else {
            return;
        };
        if engine.frame_timing.should_render() {
            event_loop.set_control_flow(ControlFlow::Poll);
            window.request_redraw();
        } else {
            let wait = engine.frame_timing.time_until_next_frame();
            event_loop
                .set_control_flow(ControlFlow::WaitUntil(Instant::now() + wait));
        }
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    use super::*;

    fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> Touch {
        Touch {
            // SAFETY: only used as an opaque value, never passed to winit.
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id,
        }
    }

    #[test]
    fn single_touch_down_requests_pick() {
        let mut tracker = TouchTracker::default();
        let events = tracker.update(&touch(1, TouchPhase::Started, 5.0, 6.0));
        assert_eq!(
            events,
            [
                InputEvent::PointerDown {
                    x: 5.0,
                    y: 6.0,
                    button: PointerButton::Left
                },
                InputEvent::RequestPick
            ]
        );
    }

    #[test]
    fn second_finger_switches_to_multi_touch() {
        let mut tracker = TouchTracker::default();
        let _ = tracker.update(&touch(1, TouchPhase::Started, 0.0, 0.0));
        let events = tracker.update(&touch(2, TouchPhase::Started, 100.0, 0.0));
        assert_eq!(events[0], InputEvent::TouchStateChanged);
        assert!(matches!(events[1], InputEvent::MultiTouch { x2, .. } if x2 == 100.0));

        let events = tracker.update(&touch(2, TouchPhase::Ended, 100.0, 0.0));
        assert_eq!(events, [InputEvent::TouchStateChanged]);
        let events = tracker.update(&touch(1, TouchPhase::Ended, 0.0, 0.0));
        assert_eq!(events, [InputEvent::PointerUp]);
    }
}
