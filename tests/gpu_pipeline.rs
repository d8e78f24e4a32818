//! Headless GPU tests for the frame target, picking and texture registry.
//!
//! Each test skips itself when the machine has no usable adapter. Given an
//! adapter, the scene and picking pipelines must build.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::print_stderr)]

use glam::{Vec2, Vec3};
use instaview::gpu::render_context::RenderContext;
use instaview::gpu::shader_composer::ShaderComposer;
use instaview::gpu::texture_registry::TextureRegistry;
use instaview::model::{DecodedImage, ModelData};
use instaview::options::Options;
use instaview::renderer::FrameTarget;
use instaview::{InputEvent, PickResult, PointerButton, SceneRenderer};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn context(width: u32, height: u32, msaa_cap: u32) -> Option<RenderContext> {
    match pollster::block_on(RenderContext::headless(FORMAT, width, height, msaa_cap)) {
        Ok(context) => Some(context),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

/// Copy a whole RGBA8 texture into memory, row padding removed.
fn read_rgba(context: &RenderContext, texture: &wgpu::Texture) -> Vec<u8> {
    let (width, height) = (texture.width(), texture.height());
    let unpadded = width * 4;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback"),
        size: u64::from(padded * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = context.create_encoder("Readback Encoder");
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    context.submit(encoder);

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |result| result.unwrap());
    let _ = context.device.poll(wgpu::PollType::Wait).unwrap();

    let mapped = slice.get_mapped_range();
    mapped
        .chunks(padded as usize)
        .flat_map(|row| row[..unpadded as usize].iter().copied())
        .collect()
}

/// An RGBA8 texture the blit can draw into and tests can read back.
fn screen_texture(context: &RenderContext) -> wgpu::Texture {
    context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Screen"),
        size: wgpu::Extent3d {
            width: context.width(),
            height: context.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Window pixel of a world-space point under the renderer's camera.
fn project(renderer: &SceneRenderer, world: Vec3) -> Vec2 {
    let camera = renderer.camera();
    let clip = camera.projection_matrix() * camera.view_matrix() * world.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    let (w, h) = (renderer.context().width() as f32, renderer.context().height() as f32);
    Vec2::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h)
}

/// A renderer whose pipelines all built. `None` only without an adapter.
fn scene_renderer(
    width: u32,
    height: u32,
    msaa_cap: u32,
    options: Options,
) -> Option<SceneRenderer> {
    let context = context(width, height, msaa_cap)?;
    let renderer = SceneRenderer::with_context(context, options).unwrap();
    assert!(renderer.scene_ready(), "scene pipelines failed to build");
    assert!(renderer.picking_available(), "picking pass failed to build");
    Some(renderer)
}

fn cube_renderer(width: u32, height: u32) -> Option<SceneRenderer> {
    let mut renderer = scene_renderer(width, height, 4, Options::default())?;
    renderer.set_model(&ModelData::unit_cube());
    renderer.update(0.0);
    Some(renderer)
}

fn send_all(renderer: &SceneRenderer, events: &[InputEvent]) {
    let sender = renderer.input_sender();
    for &event in events {
        assert!(sender.send(event));
    }
}

fn down(at: Vec2, button: PointerButton) -> InputEvent {
    InputEvent::PointerDown {
        x: at.x,
        y: at.y,
        button,
    }
}

fn move_to(at: Vec2) -> InputEvent {
    InputEvent::PointerMove { x: at.x, y: at.y }
}

#[test]
fn resolved_frame_holds_clear_color() {
    let Some(context) = context(WIDTH, HEIGHT, 4) else {
        return;
    };
    let mut composer = ShaderComposer::new().unwrap();
    let red = wgpu::Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    let target = FrameTarget::new(&context, &mut composer, red).unwrap();

    let screen = screen_texture(&context);
    let screen_view = screen.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = context.create_encoder("Clear Test");
    {
        let pass = target.begin_frame(&mut encoder);
        target.end_frame(pass);
    }
    target.draw_to_screen(&mut encoder, &screen_view);
    context.submit(encoder);

    let resolved = read_rgba(&context, target.resolve_texture());
    assert_eq!(resolved.len(), (WIDTH * HEIGHT * 4) as usize);
    assert!(resolved.chunks(4).all(|p| p == [255, 0, 0, 255]));

    let blitted = read_rgba(&context, &screen);
    assert!(blitted.chunks(4).all(|p| p == [255, 0, 0, 255]));
}

#[test]
fn frame_target_resize_rejects_zero_extent() {
    let Some(context) = context(WIDTH, HEIGHT, 1) else {
        return;
    };
    let mut composer = ShaderComposer::new().unwrap();
    let mut target = FrameTarget::new(&context, &mut composer, wgpu::Color::BLACK).unwrap();
    assert!(target.resize(&context.device, 0, 32).is_err());
    target.resize(&context.device, 32, 16).unwrap();
    assert_eq!((target.width(), target.height()), (32, 16));
}

#[test]
fn pick_hits_instance_under_pointer() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    assert_eq!(renderer.instances().count(), 4);

    let (min, max) = renderer.instances().bounds();
    for instance in renderer.instances().instances().to_vec() {
        let pointer = project(&renderer, instance.centre(min, max));
        assert_eq!(
            renderer.pick_at(pointer),
            PickResult::Instance(instance.id),
            "instance {} at {pointer}",
            instance.id
        );
    }
    assert_eq!(renderer.last_pick(), PickResult::Instance(4));
}

#[test]
fn pick_misses_on_empty_corner_and_outside_viewport() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    assert_eq!(renderer.pick_at(Vec2::new(1.0, 1.0)), PickResult::Background);
    assert_eq!(renderer.pick_at(Vec2::new(-5.0, 10.0)), PickResult::Background);
    assert_eq!(renderer.pick_at(Vec2::new(10.0, 256.0)), PickResult::Background);
}

#[test]
fn pick_without_model_is_background() {
    let Some(mut renderer) = scene_renderer(WIDTH, HEIGHT, 1, Options::default()) else {
        return;
    };
    assert!(!renderer.has_model());
    assert_eq!(renderer.pick_at(Vec2::new(32.0, 32.0)), PickResult::Background);
}

#[test]
fn queued_pick_updates_interactor() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    let (min, max) = renderer.instances().bounds();
    let target = renderer.instances().instances()[1];
    let pointer = project(&renderer, target.centre(min, max));

    send_all(
        &renderer,
        &[down(pointer, PointerButton::Left), InputEvent::RequestPick],
    );
    renderer.update(0.0);

    assert_eq!(renderer.last_pick(), PickResult::Instance(target.id));
    assert_eq!(renderer.interactor().last_picked(), target.id);
}

#[test]
fn tap_in_one_frame_leaves_nothing_selected() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    let (min, max) = renderer.instances().bounds();
    let target = renderer.instances().instances()[1];
    let pointer = project(&renderer, target.centre(min, max));

    // Down, pick and up all land in the same frame.
    send_all(
        &renderer,
        &[
            down(pointer, PointerButton::Left),
            InputEvent::RequestPick,
            InputEvent::PointerUp,
        ],
    );
    renderer.update(0.0);

    assert_eq!(renderer.last_pick(), PickResult::Instance(target.id));
    assert_eq!(renderer.interactor().last_picked(), 0);
    assert_eq!(renderer.interactor().state(), instaview::input::InteractionState::None);

    // With nothing selected a right drag pans.
    let start = Vec2::new(100.0, 100.0);
    send_all(
        &renderer,
        &[
            down(start, PointerButton::Right),
            move_to(start + Vec2::new(40.0, 0.0)),
            InputEvent::PointerUp,
        ],
    );
    renderer.update(0.0);
    assert_ne!(renderer.camera().raw().target, Vec3::ZERO);
}

#[test]
fn dragged_instance_is_picked_at_its_new_position() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    let (min, max) = renderer.instances().bounds();
    let target = renderer.instances().instances()[1];
    let centre = target.centre(min, max);

    // A point on the front face's plane, above the undragged cube, on the
    // side where the drag weight (the face's u coordinate) is 0.8.
    let above = project(&renderer, centre + Vec3::new(0.03, 0.10, 0.05));
    assert_eq!(renderer.pick_at(above), PickResult::Background);

    // Select, then drag 10 px up: offset dy = -0.1 lifts that side by 0.08.
    let grab = project(&renderer, centre);
    send_all(
        &renderer,
        &[
            down(grab, PointerButton::Left),
            InputEvent::RequestPick,
            move_to(grab - Vec2::new(0.0, 10.0)),
        ],
    );
    renderer.update(0.0);

    assert_eq!(renderer.interactor().last_picked(), target.id);
    let offset = renderer.instances().offset(target.id).unwrap();
    assert!(offset.dx.abs() < 1e-6);
    assert!((offset.dy + 0.1).abs() < 1e-5, "dy = {}", offset.dy);

    assert_eq!(renderer.pick_at(above), PickResult::Instance(target.id));
}

#[test]
fn new_model_picks_once_at_last_pointer() {
    let Some(mut renderer) = cube_renderer(256, 256) else {
        return;
    };
    let (min, max) = renderer.instances().bounds();
    let target = renderer.instances().instances()[2];
    let pointer = project(&renderer, target.centre(min, max));

    // Same model again, so the layout and camera framing are unchanged.
    renderer.set_model(&ModelData::unit_cube());
    send_all(
        &renderer,
        &[down(pointer, PointerButton::Left), InputEvent::PointerUp],
    );
    renderer.update(0.0);
    assert_eq!(renderer.last_pick(), PickResult::Instance(target.id));
    assert_eq!(renderer.interactor().last_picked(), target.id);

    assert_eq!(renderer.pick_at(Vec2::new(1.0, 1.0)), PickResult::Background);
    renderer.update(0.0);
    assert_eq!(renderer.last_pick(), PickResult::Background);
}

#[test]
fn overlay_draws_axes_and_both_box_colors() {
    let mut options = Options::default();
    options.render.show_bounding_box = true;
    let Some(mut renderer) = scene_renderer(256, 256, 1, options) else {
        return;
    };
    renderer.set_model(&ModelData::unit_cube());
    renderer.update(0.0);

    let screen = screen_texture(renderer.context());
    renderer.render_to_view(&screen.create_view(&wgpu::TextureViewDescriptor::default()));
    let pixels = read_rgba(renderer.context(), &screen);

    let has = |rgb: [u8; 3]| pixels.chunks(4).any(|p| p[..3] == rgb);
    assert!(has([255, 255, 0]), "no whole-model box");
    assert!(has([0, 255, 255]), "no instance box");
    assert!(has([255, 0, 0]), "no x axis");
    assert!(has([0, 255, 0]), "no y axis");
}

#[test]
fn registry_uploads_each_key_once() {
    let Some(context) = context(4, 4, 1) else {
        return;
    };
    let mut registry = TextureRegistry::new(&context.device, &context.queue);
    assert!(registry.is_empty());

    let image = DecodedImage {
        key: "textures/bark.png".to_owned(),
        width: 2,
        height: 2,
        rgba: vec![200; 16],
    };
    let first = registry.get_or_upload(&context.device, &context.queue, &image);
    let second = registry.get_or_upload(&context.device, &context.queue, &image);
    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("textures/bark.png"), Some(first));
    assert_ne!(first, registry.fallback());
}
