/// Platform-agnostic input events.
///
/// Coordinates are window pixels with a top-left origin. Events are sent
/// through an [`InputSender`](super::InputSender) and applied to the
/// [`Interactor`](super::Interactor) at the top of the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A pointer or first finger went down.
    PointerDown {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
        /// Which button is held.
        button: PointerButton,
    },
    /// The pointer moved to an absolute position.
    PointerMove {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
    },
    /// The pointer or finger was released.
    PointerUp,
    /// Scroll wheel (positive = zoom in).
    Scroll {
        /// Scroll amount in lines.
        delta: f32,
    },
    /// Two fingers are down at the given positions.
    MultiTouch {
        /// First finger, x.
        x1: f32,
        /// First finger, y.
        y1: f32,
        /// Second finger, x.
        x2: f32,
        /// Second finger, y.
        y2: f32,
    },
    /// The set of touching fingers changed (e.g. all released).
    TouchStateChanged,
    /// A platform pinch gesture reported a scale factor.
    Scale {
        /// Relative scale since the previous event.
        factor: f32,
    },
    /// Pick the instance under the last pointer position.
    RequestPick,
    /// Show or hide the bounding-box overlay.
    ToggleBoundingBox,
}

/// Platform-agnostic pointer button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Primary (left) mouse button, or a single finger.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

#[cfg(feature = "viewer")]
impl PointerButton {
    /// Map a winit button; buttons beyond the three standard ones have no
    /// equivalent.
    pub fn from_winit(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(Self::Left),
            winit::event::MouseButton::Right => Some(Self::Right),
            winit::event::MouseButton::Middle => Some(Self::Middle),
            _ => None,
        }
    }
}
