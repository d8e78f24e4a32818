//! The scene renderer: construction, input plumbing, model management and
//! the per-frame update and render.

mod construction;
mod frame;
mod input;
mod scene_management;

use std::sync::mpsc;

use glam::Vec2;

use crate::camera::controller::OrbitCamera;
use crate::gpu::globals::{GlobalsBlock, SceneGlobals};
use crate::gpu::render_context::RenderContext;
use crate::gpu::texture_registry::TextureRegistry;
use crate::input::{InputReceiver, InputSender, Interactor};
use crate::model::{GpuModel, ModelLoader};
use crate::options::Options;
use crate::renderer::picking::{PickResult, PickingPass};
use crate::renderer::{
    AxisPass, BoundingBoxPass, FrameTarget, InstanceSet, LoadingView,
    ScenePass,
};
use crate::util::frame_timing::FrameTiming;

/// Pipelines that draw the model. Absent when scene setup failed, in which
/// case only the loading view is rendered.
struct ScenePipelines {
    scene: ScenePass,
    axis: Option<AxisPass>,
    bounding_box: Option<BoundingBoxPass>,
    picking: Option<PickingPass>,
}

/// The root of the viewer: owns every GPU resource and runs the frame.
///
/// Each frame, in order:
///
/// 1. queued input is applied to the [`Interactor`] and camera in send
///    order, each requested pick running in its own command buffer at its
///    place in the batch;
/// 2. the camera advances toward its input state;
/// 3. the scene, axis helper and optional boxes render into the
///    [`FrameTarget`], which resolves;
/// 4. the resolved image is blitted to the screen.
///
/// Input arrives through [`input_sender`](Self::input_sender) from any
/// thread. Models load through [`load_model`](Self::load_model) and appear
/// on the first frame after parsing finishes; until then the loading view
/// is drawn.
pub struct SceneRenderer {
    context: RenderContext,
    options: Options,
    frame_target: FrameTarget,
    loading_view: LoadingView,
    pipelines: Option<ScenePipelines>,
    globals: GlobalsBlock<SceneGlobals>,
    globals_values: SceneGlobals,
    instances: InstanceSet,
    registry: TextureRegistry,
    model: Option<GpuModel>,
    loader: ModelLoader,
    camera: OrbitCamera,
    interactor: Interactor,
    input_tx: InputSender,
    input_rx: InputReceiver,
    drag_rx: mpsc::Receiver<(u32, Vec2)>,
    last_pick: PickResult,
    first_pick_pending: bool,
    /// Frame pacing and FPS readout.
    pub frame_timing: FrameTiming,
}

impl SceneRenderer {
    /// The GPU context.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Current options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The camera.
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// The interaction state machine.
    pub fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// Instance transforms and offsets.
    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }

    /// The off-screen scene target.
    pub fn frame_target(&self) -> &FrameTarget {
        &self.frame_target
    }

    /// `true` once a model has been uploaded.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// `true` when the scene pipelines were built; otherwise only the
    /// loading view renders.
    pub fn scene_ready(&self) -> bool {
        self.pipelines.is_some()
    }

    /// `true` when the picking pass and its surface exist.
    pub fn picking_available(&self) -> bool {
        self.pipelines
            .as_ref()
            .and_then(|p| p.picking.as_ref())
            .is_some_and(PickingPass::is_available)
    }

    /// Outcome of the most recent pick.
    pub fn last_pick(&self) -> PickResult {
        self.last_pick
    }
}
