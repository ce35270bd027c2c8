//! Headless frame pipeline demo
//!
//! Builds a small ECS scene, captures it every frame on the main thread and
//! executes the compiled command buffers on a separate render thread through
//! a [`StatisticsCommandProcessor`].
//!
//! ```bash
//! cargo run --example frame_pipeline -- --frames 120 --objects 500 --shadows
//! RUST_LOG=debug cargo run --example frame_pipeline
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use clap::Parser;
use glam::{Mat4, UVec2, Vec3, Vec4};

use ember_render::frame::{RenderLayer, RenderObject, ShadowMapId, ShadowMapTarget};
use ember_render::resources::{
    BoundingSphere, RenderDynamicMesh, RenderMaterialGroupManager, RenderMesh, RenderMeshManager, SpriteVertex,
    VertexFormat,
};
use ember_render::scene::{
    extract_render_snapshot, AmbientLight, Camera, DirectionalLight, MainCamera, MeshRenderer, PointLight, Projection,
    Transform,
};
use ember_render::{RenderCapabilities, Renderer, RendererConfig, StatisticsCommandProcessor, TaskScheduler};

#[derive(Parser, Debug)]
#[command(
    name = "frame_pipeline",
    about = "Run the snapshot to command buffer pipeline without a GPU"
)]
struct Args {
    /// Number of frames to capture.
    #[arg(long, default_value = "60")]
    frames: u64,

    /// Number of spinning objects in the scene.
    #[arg(long, default_value = "200")]
    objects: usize,

    /// Worker threads compiling frames.
    #[arg(long, default_value = "2")]
    workers: usize,

    /// Let the sun cast shadows.
    #[arg(long)]
    shadows: bool,

    /// Viewport width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Viewport height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,
}

#[derive(Component)]
struct Spin(f32);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let resolution = UVec2::new(args.width, args.height);

    let config = RendererConfig::default()
        .with_capabilities(RenderCapabilities::default().with_shadow_maps(args.shadows));
    let renderer = Arc::new(Renderer::new(config, Arc::new(TaskScheduler::new(args.workers))));

    let materials = RenderMaterialGroupManager::new();
    let meshes = RenderMeshManager::new();
    let mut world = World::new();
    build_scene(&mut world, &materials, &meshes, &args);
    let hud = materials.create_unlit_render_material_group("hud", None, Vec4::new(1.0, 1.0, 1.0, 0.8), true);

    let capturing = Arc::new(AtomicBool::new(true));
    let render_thread = {
        let renderer = renderer.clone();
        let capturing = capturing.clone();
        std::thread::Builder::new()
            .name("render".to_string())
            .spawn(move || render_loop(&renderer, &capturing))
            .expect("failed to spawn render thread")
    };

    let started = Instant::now();
    for frame in 0..args.frames {
        for (mut transform, spin) in world.query::<(&mut Transform, &Spin)>().iter_mut(&mut world) {
            transform.rotate_axis(Vec3::Y, spin.0 / 60.0);
        }

        let Some(mut snapshot) = extract_render_snapshot(&mut world, resolution, Vec4::new(0.05, 0.05, 0.08, 1.0))
        else {
            log::error!("Scene has no main camera");
            break;
        };

        // A per-frame sprite, the way text or a progress bar would be drawn.
        let progress = (frame + 1) as f32 / args.frames as f32;
        let bar = snapshot.add_render_dynamic_mesh(progress_bar(progress, resolution));
        snapshot.add_render_object(RenderObject::new(bar, hud.clone(), Mat4::IDENTITY).with_layer(RenderLayer::Ui));

        materials.on_render_snapshot(&mut snapshot);
        meshes.on_render_snapshot(&mut snapshot);
        if let Err(err) = renderer.process_render_snapshot(snapshot) {
            log::error!("Failed to submit frame {frame}: {err}");
            break;
        }
    }
    capturing.store(false, Ordering::Release);

    match render_thread.join() {
        Ok(stats) => {
            let elapsed = started.elapsed();
            log::info!(
                "{} frames in {:.1?} ({:.1} fps)",
                stats.frames,
                elapsed,
                stats.frames as f64 / elapsed.as_secs_f64()
            );
            log::info!("{stats:#?}");
        }
        Err(_) => log::error!("Render thread panicked"),
    }
}

fn render_loop(renderer: &Renderer, capturing: &AtomicBool) -> ember_render::commands::RenderStatistics {
    let mut processor = StatisticsCommandProcessor::new();
    loop {
        match renderer.process_render_command_queue(&mut processor) {
            Ok(0) => {
                if !capturing.load(Ordering::Acquire) && renderer.pending_frame_count() == 0 {
                    break;
                }
                std::thread::sleep(Duration::from_micros(200));
            }
            Ok(_) => {}
            Err(err) => {
                log::error!("Render thread stopped: {err}");
                break;
            }
        }
    }
    *processor.stats()
}

fn build_scene(world: &mut World, materials: &RenderMaterialGroupManager, meshes: &RenderMeshManager, args: &Args) {
    let aspect = args.width as f32 / args.height.max(1) as f32;
    world.spawn((
        Camera::new(Projection::perspective(60.0, aspect, 0.1, 200.0)),
        Transform::from_position(Vec3::new(0.0, 15.0, 40.0)).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));

    world.spawn(AmbientLight::default());
    let sun = DirectionalLight::new(Vec3::new(-0.3, -1.0, -0.2), Vec3::new(1.0, 0.95, 0.9), 1.0);
    let sun = if args.shadows {
        let light_view_projection = Mat4::orthographic_rh(-50.0, 50.0, -50.0, 50.0, 0.1, 200.0)
            * Mat4::look_at_rh(Vec3::new(30.0, 100.0, 20.0), Vec3::ZERO, Vec3::Y);
        let target = ShadowMapTarget {
            id: ShadowMapId(0),
            resolution: UVec2::splat(2048),
        };
        sun.with_shadows(target, light_view_projection)
    } else {
        sun
    };
    world.spawn(sun);

    for (i, colour) in [Vec3::new(1.0, 0.3, 0.2), Vec3::new(0.2, 0.4, 1.0)].into_iter().enumerate() {
        let x = if i == 0 { -15.0 } else { 15.0 };
        world.spawn((PointLight::new(colour, 4.0, 20.0), Transform::from_position(Vec3::new(x, 5.0, 0.0))));
    }

    let cube = meshes.add_render_mesh(RenderMesh::new(
        "cube",
        VertexFormat::StaticMesh,
        24,
        36,
        BoundingSphere::new(Vec3::ZERO, 3f32.sqrt()),
    ));
    let groups = [
        materials.create_blinn_render_material_group("red", None, Vec4::new(0.8, 0.1, 0.1, 1.0)),
        materials.create_blinn_render_material_group("green", None, Vec4::new(0.1, 0.8, 0.1, 1.0)),
        materials.create_blinn_render_material_group("blue", None, Vec4::new(0.1, 0.1, 0.8, 1.0)),
        materials.create_unlit_render_material_group("glass", None, Vec4::new(0.7, 0.9, 1.0, 0.4), true),
    ];

    let side = (args.objects as f32).sqrt().ceil().max(1.0) as usize;
    for i in 0..args.objects {
        let (row, column) = (i / side, i % side);
        let position = Vec3::new(
            (column as f32 - side as f32 / 2.0) * 3.0,
            0.0,
            (row as f32 - side as f32 / 2.0) * 3.0,
        );
        world.spawn((
            MeshRenderer::new(cube.clone(), groups[i % groups.len()].clone()),
            Transform::from_position(position),
            Spin(1.0 + (i % 5) as f32 * 0.5),
        ));
    }
    log::info!("Scene built with {} objects", args.objects);
}

fn progress_bar(progress: f32, resolution: UVec2) -> RenderDynamicMesh {
    let width = resolution.x as f32 * progress.clamp(0.0, 1.0);
    let colour = [255, 255, 255, 200];
    let vertex = |x: f32, y: f32, u: f32, v: f32| SpriteVertex {
        position: [x, y, 0.0],
        uv: [u, v],
        colour,
    };
    let vertices = [
        vertex(0.0, 0.0, 0.0, 0.0),
        vertex(width, 0.0, 1.0, 0.0),
        vertex(width, 8.0, 1.0, 1.0),
        vertex(0.0, 8.0, 0.0, 1.0),
    ];
    let bounds = BoundingSphere::new(Vec3::new(width / 2.0, 4.0, 0.0), width / 2.0 + 4.0);
    RenderDynamicMesh::new(VertexFormat::Sprite, &vertices, vec![0, 1, 2, 0, 2, 3], bounds)
}
