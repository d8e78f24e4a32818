//! GPU-based instance picking.
//!
//! Renders instance ids to an offscreen buffer and reads back the pixel
//! under the pointer to determine which instance was touched.

mod pass;
mod result;
mod surface;

pub use pass::{PickScene, PickingPass};
pub use result::{PickResult, CLEAR_SENTINEL};
pub use surface::{PickSurface, PICK_FORMAT};
