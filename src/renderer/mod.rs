//! Render passes: the MSAA scene target and its blit, the instanced mesh
//! pipeline, the axis helper, the bounding-box overlay, the loading view
//! and GPU picking.

/// World-axis helper lines.
pub mod axis;
/// Bounding-box line overlay.
pub mod bounding_box;
/// MSAA scene target, resolve and blit.
pub mod frame_target;
/// Instance transforms and drag offsets.
pub mod instances;
/// Loading placeholder.
pub mod loading_view;
/// Instance-ID picking.
pub mod picking;
/// Instanced mesh pipeline.
pub mod scene_pass;

pub use axis::AxisPass;
pub use bounding_box::BoundingBoxPass;
pub use frame_target::FrameTarget;
pub use instances::{InstanceSet, LayoutPolicy};
pub use loading_view::LoadingView;
pub use scene_pass::ScenePass;
