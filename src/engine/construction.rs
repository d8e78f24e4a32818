//! Engine construction.

use std::sync::mpsc;

use super::{ScenePipelines, SceneRenderer};
use crate::camera::controller::OrbitCamera;
use crate::error::ViewerError;
use crate::gpu::globals::{GlobalsBlock, SceneGlobals};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, ShaderKind};
use crate::gpu::texture_registry::TextureRegistry;
use crate::input::{input_channel, Interactor};
use crate::model::ModelLoader;
use crate::options::Options;
use crate::renderer::picking::{PickResult, PickingPass};
use crate::renderer::{
    AxisPass, BoundingBoxPass, FrameTarget, InstanceSet, LoadingView,
    ScenePass,
};
use crate::util::frame_timing::FrameTiming;

impl SceneRenderer {
    /// Create a renderer presenting to `window`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Gpu`] if no adapter, device or surface is
    /// available, or any error of [`with_context`](Self::with_context).
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, ViewerError> {
        let context =
            RenderContext::new(window, size, options.render.msaa_samples)
                .await?;
        Self::with_context(context, options)
    }

    /// Create a renderer on an existing context (headless or embedded).
    ///
    /// A scene pipeline that fails to build is logged and leaves the
    /// renderer drawing only the loading view. Picking, axis or
    /// bounding-box failures disable just that feature.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::FrameTarget`] if the scene target cannot be
    /// created at the context size, or [`ViewerError::Shader`] if the blit
    /// or loading shaders fail to compose.
    pub fn with_context(
        context: RenderContext,
        options: Options,
    ) -> Result<Self, ViewerError> {
        let mut composer = ShaderComposer::new()?;
        let frame_target = FrameTarget::new(
            &context,
            &mut composer,
            options.render.clear_wgpu_color(),
        )?;
        let loading_view = LoadingView::new(
            &context,
            &mut composer,
            options.scene.loading_pulse_speed,
        )?;

        let globals_values = SceneGlobals {
            wave_amp: options.scene.wave_amp,
            wave_speed: options.scene.wave_speed,
            ..SceneGlobals::default()
        };
        let globals = GlobalsBlock::new(
            &context.device,
            "Scene Globals",
            ShaderKind::Scene.globals(),
            &globals_values,
        )?;

        let instances = InstanceSet::new(&context.device, &context.queue);
        let pipelines = match build_pipelines(
            &context,
            &mut composer,
            globals.layout(),
            instances.layout(),
        ) {
            Ok(pipelines) => Some(pipelines),
            Err(e) => {
                log::error!("scene setup failed, showing loading view only: {e}");
                None
            }
        };

        let registry = TextureRegistry::new(&context.device, &context.queue);
        let camera =
            OrbitCamera::new(&options.camera, context.width(), context.height());

        let (input_tx, input_rx) = input_channel();
        let (drag_tx, drag_rx) = mpsc::channel();
        let mut interactor = Interactor::new(options.input.clone());
        interactor.set_show_bounding_box(options.render.show_bounding_box);
        interactor.set_move_callback(Box::new(move |id, delta| {
            let _ = drag_tx.send((id, delta));
        }));

        Ok(Self {
            loader: ModelLoader::new(options.scene.background_load_threshold),
            frame_timing: FrameTiming::new(options.render.target_fps),
            context,
            options,
            frame_target,
            loading_view,
            pipelines,
            globals,
            globals_values,
            instances,
            registry,
            model: None,
            camera,
            interactor,
            input_tx,
            input_rx,
            drag_rx,
            last_pick: PickResult::Background,
            first_pick_pending: false,
        })
    }
}

/// Build the model pipelines. Only the scene pass is required.
fn build_pipelines(
    context: &RenderContext,
    composer: &mut ShaderComposer,
    globals_layout: &wgpu::BindGroupLayout,
    instances_layout: &wgpu::BindGroupLayout,
) -> Result<ScenePipelines, ViewerError> {
    let scene =
        ScenePass::new(context, composer, globals_layout, instances_layout)?;

    let axis = AxisPass::new(context, composer, globals_layout)
        .inspect_err(|e| log::error!("axis helper disabled: {e}"))
        .ok();

    let bounding_box = BoundingBoxPass::new(context, composer, globals_layout)
        .inspect_err(|e| log::error!("bounding box disabled: {e}"))
        .ok();

    let picking =
        PickingPass::new(context, composer, globals_layout, instances_layout)
            .inspect_err(|e| log::error!("picking disabled: {e}"))
            .ok();

    Ok(ScenePipelines {
        scene,
        axis,
        bounding_box,
        picking,
    })
}
