//! Input handling: event types, the cross-thread event queue, and the
//! interaction state machine that turns events into camera moves, drags and
//! pick requests.

/// Platform-agnostic input events.
pub mod event;
/// Pointer and touch state machine.
pub mod interactor;
/// Single-producer, single-consumer event queue.
pub mod queue;

pub use event::{InputEvent, PointerButton};
pub use interactor::{InteractionState, Interactor, MoveCallback};
pub use queue::{input_channel, InputReceiver, InputSender};
