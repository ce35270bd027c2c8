//! Scene components and snapshot extraction

mod camera;
mod extract;
mod light;
mod transform;

pub use camera::*;
pub use extract::*;
pub use light::*;
pub use transform::*;

use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::frame::RenderLayer;
use crate::resources::{RenderMaterialGroup, RenderMesh};

/// Draws a mesh with a material group at the entity's [`Transform`]
#[derive(Component, Debug, Clone)]
pub struct MeshRenderer {
    pub mesh: RenderMesh,
    pub material_group: Arc<RenderMaterialGroup>,
    pub layer: RenderLayer,
    /// Draw order within the overlay layer, lowest first
    pub priority: u32,
}

impl MeshRenderer {
    pub fn new(mesh: RenderMesh, material_group: Arc<RenderMaterialGroup>) -> Self {
        Self {
            mesh,
            material_group,
            layer: RenderLayer::Standard,
            priority: 0,
        }
    }

    /// Draw in the overlay layer at `priority`
    pub fn overlay(mut self, priority: u32) -> Self {
        self.layer = RenderLayer::Ui;
        self.priority = priority;
        self
    }
}
