//! Drawable items

use std::sync::Arc;

use glam::Mat4;

use crate::resources::{BoundingSphere, RenderMaterial, RenderMaterialGroup, RenderMesh};

/// Which camera an object is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderLayer {
    /// World-space object drawn by the scene camera, culled and depth sorted
    #[default]
    Standard,
    /// Screen-space overlay drawn after the scene in priority order
    Ui,
}

/// A renderable captured from the scene
///
/// Holds the whole material group; the frame compiler picks the variant each
/// pass needs.
#[derive(Debug, Clone)]
pub struct RenderObject {
    mesh: RenderMesh,
    material_group: Arc<RenderMaterialGroup>,
    world_matrix: Mat4,
    bounding_sphere: BoundingSphere,
    layer: RenderLayer,
    priority: u32,
}

impl RenderObject {
    pub fn new(mesh: RenderMesh, material_group: Arc<RenderMaterialGroup>, world_matrix: Mat4) -> Self {
        let bounding_sphere = mesh.bounding_sphere().transformed(&world_matrix);
        Self {
            mesh,
            material_group,
            world_matrix,
            bounding_sphere,
            layer: RenderLayer::Standard,
            priority: 0,
        }
    }

    pub fn with_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Draw order within the UI layer; lower draws first
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn mesh(&self) -> &RenderMesh {
        &self.mesh
    }

    pub fn material_group(&self) -> &Arc<RenderMaterialGroup> {
        &self.material_group
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Bounds in world space
    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    pub fn layer(&self) -> RenderLayer {
        self.layer
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Resolve this object against the material chosen for a pass
    pub(crate) fn to_pass_object(&self, material: &RenderMaterial) -> RenderPassObject {
        RenderPassObject::new(
            material.clone(),
            self.mesh.clone(),
            self.world_matrix,
            self.bounding_sphere,
            self.priority,
        )
    }
}

/// One draw within a render pass
#[derive(Debug, Clone)]
pub struct RenderPassObject {
    material: RenderMaterial,
    mesh: RenderMesh,
    world_matrix: Mat4,
    bounding_sphere: BoundingSphere,
    priority: u32,
}

impl RenderPassObject {
    pub fn new(
        material: RenderMaterial,
        mesh: RenderMesh,
        world_matrix: Mat4,
        bounding_sphere: BoundingSphere,
        priority: u32,
    ) -> Self {
        Self {
            material,
            mesh,
            world_matrix,
            bounding_sphere,
            priority,
        }
    }

    pub fn material(&self) -> &RenderMaterial {
        &self.material
    }

    pub fn mesh(&self) -> &RenderMesh {
        &self.mesh
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounding_sphere
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }
}
