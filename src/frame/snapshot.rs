//! Per-frame snapshot of renderable state
//!
//! The main thread fills a [`RenderSnapshot`] while walking the scene. The
//! renderer then claims each field, moving it out so the snapshot cannot be
//! read again; claiming a field twice is a bug in the caller and panics.

use glam::{UVec2, Vec4};

use crate::commands::RenderCommandList;
use crate::resources::{RenderDynamicMesh, RenderMesh};

use super::{RenderAmbientLight, RenderCamera, RenderDirectionalLight, RenderObject, RenderPointLight};

/// Move a field out of the snapshot, panicking if it was already claimed
fn claim<T>(field: &mut Option<T>, name: &str) -> T {
    match field.take() {
        Some(value) => value,
        None => panic!("render snapshot {name} has already been claimed"),
    }
}

fn unclaimed<'a, T>(field: &'a mut Option<T>, name: &str) -> &'a mut T {
    match field {
        Some(value) => value,
        None => panic!("render snapshot {name} has already been claimed"),
    }
}

/// Write-once capture of everything needed to render one frame
#[derive(Debug)]
pub struct RenderSnapshot {
    resolution: UVec2,
    clear_colour: Vec4,
    camera: Option<RenderCamera>,
    ambient_lights: Option<Vec<RenderAmbientLight>>,
    directional_lights: Option<Vec<RenderDirectionalLight>>,
    point_lights: Option<Vec<RenderPointLight>>,
    render_objects: Option<Vec<RenderObject>>,
    dynamic_meshes: Option<Vec<RenderMesh>>,
    pre_render_commands: Option<RenderCommandList>,
    post_render_commands: Option<RenderCommandList>,
}

impl RenderSnapshot {
    pub fn new(resolution: UVec2, clear_colour: Vec4, camera: RenderCamera) -> Self {
        Self {
            resolution,
            clear_colour,
            camera: Some(camera),
            ambient_lights: Some(Vec::new()),
            directional_lights: Some(Vec::new()),
            point_lights: Some(Vec::new()),
            render_objects: Some(Vec::new()),
            dynamic_meshes: Some(Vec::new()),
            pre_render_commands: Some(RenderCommandList::new()),
            post_render_commands: Some(RenderCommandList::new()),
        }
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn clear_colour(&self) -> Vec4 {
        self.clear_colour
    }

    pub fn set_clear_colour(&mut self, clear_colour: Vec4) {
        self.clear_colour = clear_colour;
    }

    pub fn set_camera(&mut self, camera: RenderCamera) {
        *unclaimed(&mut self.camera, "camera") = camera;
    }

    pub fn add_ambient_light(&mut self, light: RenderAmbientLight) {
        unclaimed(&mut self.ambient_lights, "ambient lights").push(light);
    }

    pub fn add_directional_light(&mut self, light: RenderDirectionalLight) {
        unclaimed(&mut self.directional_lights, "directional lights").push(light);
    }

    pub fn add_point_light(&mut self, light: RenderPointLight) {
        unclaimed(&mut self.point_lights, "point lights").push(light);
    }

    pub fn add_render_object(&mut self, object: RenderObject) {
        unclaimed(&mut self.render_objects, "render objects").push(object);
    }

    /// Take ownership of per-frame mesh data
    ///
    /// Returns the handle render objects use to reference it. The data is
    /// released once the frame it belongs to has been executed.
    pub fn add_render_dynamic_mesh(&mut self, mesh: RenderDynamicMesh) -> RenderMesh {
        let mesh = mesh.into_render_mesh();
        unclaimed(&mut self.dynamic_meshes, "dynamic meshes").push(mesh.clone());
        mesh
    }

    /// Commands executed before the frame, such as resource uploads
    pub fn pre_render_command_list_mut(&mut self) -> &mut RenderCommandList {
        unclaimed(&mut self.pre_render_commands, "pre-render command list")
    }

    /// Commands executed after the frame, such as resource releases
    pub fn post_render_command_list_mut(&mut self) -> &mut RenderCommandList {
        unclaimed(&mut self.post_render_commands, "post-render command list")
    }

    /// Both command lists at once
    pub fn command_lists_mut(&mut self) -> (&mut RenderCommandList, &mut RenderCommandList) {
        (
            unclaimed(&mut self.pre_render_commands, "pre-render command list"),
            unclaimed(&mut self.post_render_commands, "post-render command list"),
        )
    }

    pub fn claim_render_camera(&mut self) -> RenderCamera {
        claim(&mut self.camera, "camera")
    }

    pub fn claim_ambient_lights(&mut self) -> Vec<RenderAmbientLight> {
        claim(&mut self.ambient_lights, "ambient lights")
    }

    pub fn claim_directional_lights(&mut self) -> Vec<RenderDirectionalLight> {
        claim(&mut self.directional_lights, "directional lights")
    }

    pub fn claim_point_lights(&mut self) -> Vec<RenderPointLight> {
        claim(&mut self.point_lights, "point lights")
    }

    pub fn claim_render_objects(&mut self) -> Vec<RenderObject> {
        claim(&mut self.render_objects, "render objects")
    }

    pub fn claim_render_dynamic_meshes(&mut self) -> Vec<RenderMesh> {
        claim(&mut self.dynamic_meshes, "dynamic meshes")
    }

    pub fn claim_pre_render_command_list(&mut self) -> RenderCommandList {
        claim(&mut self.pre_render_commands, "pre-render command list")
    }

    pub fn claim_post_render_command_list(&mut self) -> RenderCommandList {
        claim(&mut self.post_render_commands, "post-render command list")
    }
}
