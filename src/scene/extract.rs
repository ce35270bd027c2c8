//! Capturing ECS state into render snapshots

use bevy_ecs::prelude::*;
use glam::{UVec2, Vec4};

use crate::frame::{RenderObject, RenderSnapshot};

use super::{AmbientLight, Camera, DirectionalLight, MainCamera, MeshRenderer, PointLight, Transform};

/// Capture the world's renderable state for one frame
///
/// Returns `None` when no entity carries [`MainCamera`]. With several main
/// cameras the first one found wins.
pub fn extract_render_snapshot(world: &mut World, resolution: UVec2, clear_colour: Vec4) -> Option<RenderSnapshot> {
    let camera = {
        let mut cameras = world.query_filtered::<(&Camera, &Transform), With<MainCamera>>();
        let (camera, transform) = cameras.iter(world).next()?;
        camera.to_render_camera(transform)
    };
    let mut snapshot = RenderSnapshot::new(resolution, clear_colour, camera);

    let mut ambient_lights = world.query::<&AmbientLight>();
    for light in ambient_lights.iter(world) {
        snapshot.add_ambient_light(light.to_render_light());
    }

    let mut directional_lights = world.query::<&DirectionalLight>();
    for light in directional_lights.iter(world) {
        snapshot.add_directional_light(light.to_render_light());
    }

    let mut point_lights = world.query::<(&PointLight, &Transform)>();
    for (light, transform) in point_lights.iter(world) {
        snapshot.add_point_light(light.to_render_light(transform.position));
    }

    let mut renderers = world.query::<(&MeshRenderer, &Transform)>();
    for (renderer, transform) in renderers.iter(world) {
        let object = RenderObject::new(
            renderer.mesh.clone(),
            renderer.material_group.clone(),
            transform.matrix(),
        )
        .with_layer(renderer.layer)
        .with_priority(renderer.priority);
        snapshot.add_render_object(object);
    }

    log::trace!("Extracted render snapshot");
    Some(snapshot)
}
