//! Deferred resource load and unload
//!
//! Resources are created on the main thread but their GPU side can only be
//! touched by the render thread. Managers queue the change and turn it into
//! load commands (executed before the frame) and unload commands (executed
//! after it) the next time a snapshot is taken.

use std::sync::Arc;

use glam::Vec4;
use parking_lot::Mutex;

use crate::commands::{RenderCommand, RenderCommandList};
use crate::frame::RenderSnapshot;

use super::{
    BlendMode, CullFace, MaterialDesc, MaterialSlot, RenderMaterial, RenderMaterialGroup, RenderMesh,
    ShadingType, TextureId, VertexFormat,
};

/// Resource tracked by a [`ResourceQueues`]
trait ManagedResource: Clone {
    fn same(&self, other: &Self) -> bool;
    fn load_command(&self) -> RenderCommand;
    fn unload_command(&self) -> RenderCommand;
}

impl ManagedResource for Arc<RenderMaterialGroup> {
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }

    fn load_command(&self) -> RenderCommand {
        RenderCommand::LoadMaterialGroup(self.clone())
    }

    fn unload_command(&self) -> RenderCommand {
        RenderCommand::UnloadMaterialGroup(self.clone())
    }
}

impl ManagedResource for RenderMesh {
    fn same(&self, other: &Self) -> bool {
        self == other
    }

    fn load_command(&self) -> RenderCommand {
        RenderCommand::LoadMesh(self.clone())
    }

    fn unload_command(&self) -> RenderCommand {
        RenderCommand::UnloadMesh(self.clone())
    }
}

struct ResourceQueues<T> {
    live: Vec<T>,
    pending_loads: Vec<T>,
    pending_unloads: Vec<T>,
}

impl<T: ManagedResource> ResourceQueues<T> {
    fn new() -> Self {
        Self {
            live: Vec::new(),
            pending_loads: Vec::new(),
            pending_unloads: Vec::new(),
        }
    }

    fn add(&mut self, resource: T) {
        self.live.push(resource.clone());
        self.pending_loads.push(resource);
    }

    /// Returns false if the resource is not tracked
    fn destroy(&mut self, resource: &T) -> bool {
        let Some(index) = self.live.iter().position(|r| r.same(resource)) else {
            return false;
        };
        let removed = self.live.swap_remove(index);

        // Never reached the GPU, so there is nothing to unload.
        if let Some(pending) = self.pending_loads.iter().position(|r| r.same(resource)) {
            self.pending_loads.remove(pending);
        } else {
            self.pending_unloads.push(removed);
        }
        true
    }

    fn drain_into(&mut self, pre: &mut RenderCommandList, post: &mut RenderCommandList) {
        for resource in self.pending_loads.drain(..) {
            pre.push(resource.load_command());
        }
        for resource in self.pending_unloads.drain(..) {
            post.push(resource.unload_command());
        }
    }
}

/// Tracks material groups and schedules their load and unload
///
/// All methods take `&self`; the queues are behind a mutex that is held only
/// while they are mutated, so groups can be created from any thread.
pub struct RenderMaterialGroupManager {
    queues: Mutex<ResourceQueues<Arc<RenderMaterialGroup>>>,
}

impl Default for RenderMaterialGroupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderMaterialGroupManager {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(ResourceQueues::new()),
        }
    }

    /// Take ownership of a group and queue it for loading
    pub fn add_render_material_group(&self, group: RenderMaterialGroup) -> Arc<RenderMaterialGroup> {
        let group = Arc::new(group);
        log::debug!("Queued material group '{}' for load", group.name());
        self.queues.lock().add(group.clone());
        group
    }

    /// Queue a group for unloading after the next frame
    ///
    /// # Panics
    ///
    /// Panics if the group is not managed by this manager.
    pub fn destroy_render_material_group(&self, group: &Arc<RenderMaterialGroup>) {
        let found = self.queues.lock().destroy(group);
        assert!(
            found,
            "material group '{}' is not managed by this manager",
            group.name()
        );
        log::debug!("Queued material group '{}' for unload", group.name());
    }

    /// Create an unlit group for static meshes, animated meshes and sprites
    ///
    /// Transparent groups only fill the transparent slot and cast no shadows.
    pub fn create_unlit_render_material_group(
        &self,
        name: &str,
        texture: Option<TextureId>,
        colour: Vec4,
        transparent: bool,
    ) -> Arc<RenderMaterialGroup> {
        let mut desc = MaterialDesc::new(name)
            .with_shading(ShadingType::Unlit)
            .with_colour(colour);
        desc.texture = texture;

        let mut builder = RenderMaterialGroup::builder(name);
        for format in [VertexFormat::StaticMesh, VertexFormat::AnimatedMesh, VertexFormat::Sprite] {
            if transparent {
                let material = RenderMaterial::new(desc.clone().with_transparency(BlendMode::Alpha));
                builder = builder.with_slot(format, MaterialSlot::Transparent, material);
                continue;
            }

            builder = builder.with_slot(format, MaterialSlot::Base, RenderMaterial::new(desc.clone()));
            if format != VertexFormat::Sprite {
                builder = builder.with_slot(format, MaterialSlot::ShadowMap, shadow_material(name));
            }
        }

        self.add_render_material_group(builder.build())
    }

    /// Create a Blinn-Phong lit group for static and animated meshes
    ///
    /// The base slot applies ambient light; each light pass adds one light
    /// on top with additive blending.
    pub fn create_blinn_render_material_group(
        &self,
        name: &str,
        texture: Option<TextureId>,
        colour: Vec4,
    ) -> Arc<RenderMaterialGroup> {
        let mut desc = MaterialDesc::new(name)
            .with_shading(ShadingType::Blinn)
            .with_colour(colour);
        desc.texture = texture;
        let additive = desc.clone().with_transparency(BlendMode::Additive).with_depth(true, false);

        let mut builder = RenderMaterialGroup::builder(name);
        for format in [VertexFormat::StaticMesh, VertexFormat::AnimatedMesh] {
            builder = builder
                .with_slot(format, MaterialSlot::ShadowMap, shadow_material(name))
                .with_slot(format, MaterialSlot::Base, RenderMaterial::new(desc.clone()))
                .with_slot(format, MaterialSlot::DirectionalLight, RenderMaterial::new(additive.clone()))
                .with_slot(format, MaterialSlot::DirectionalLightShadows, RenderMaterial::new(additive.clone()))
                .with_slot(format, MaterialSlot::PointLight, RenderMaterial::new(additive.clone()));
        }

        self.add_render_material_group(builder.build())
    }

    /// Move pending loads into the snapshot's pre-render list and pending
    /// unloads into its post-render list
    pub fn on_render_snapshot(&self, snapshot: &mut RenderSnapshot) {
        let mut queues = self.queues.lock();
        let (pre, post) = snapshot.command_lists_mut();
        queues.drain_into(pre, post);
    }

    /// Number of groups currently managed
    pub fn group_count(&self) -> usize {
        self.queues.lock().live.len()
    }
}

fn shadow_material(name: &str) -> RenderMaterial {
    RenderMaterial::new(
        MaterialDesc::new(&format!("{name}_shadow"))
            .with_shading(ShadingType::ShadowMap)
            .with_cull_face(CullFace::Front),
    )
}

/// Tracks static meshes and schedules their upload and release
pub struct RenderMeshManager {
    queues: Mutex<ResourceQueues<RenderMesh>>,
}

impl Default for RenderMeshManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderMeshManager {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(ResourceQueues::new()),
        }
    }

    /// Track a mesh and queue it for upload
    ///
    /// # Panics
    ///
    /// Panics if the mesh is dynamic; dynamic meshes are owned by a snapshot.
    pub fn add_render_mesh(&self, mesh: RenderMesh) -> RenderMesh {
        assert!(!mesh.is_dynamic(), "dynamic meshes cannot be managed");
        log::debug!("Queued mesh '{}' for load", mesh.name());
        self.queues.lock().add(mesh.clone());
        mesh
    }

    /// Queue a mesh for release after the next frame
    ///
    /// # Panics
    ///
    /// Panics if the mesh is not managed by this manager.
    pub fn destroy_render_mesh(&self, mesh: &RenderMesh) {
        let found = self.queues.lock().destroy(mesh);
        assert!(found, "mesh '{}' is not managed by this manager", mesh.name());
        log::debug!("Queued mesh '{}' for unload", mesh.name());
    }

    pub fn on_render_snapshot(&self, snapshot: &mut RenderSnapshot) {
        let mut queues = self.queues.lock();
        let (pre, post) = snapshot.command_lists_mut();
        queues.drain_into(pre, post);
    }

    pub fn mesh_count(&self) -> usize {
        self.queues.lock().live.len()
    }
}
