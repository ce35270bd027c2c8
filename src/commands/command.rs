//! Render commands

use std::sync::Arc;

use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::frame::{RenderTarget, ShadowMapId};
use crate::resources::{RenderMaterial, RenderMaterialGroup, RenderMesh};

/// A single instruction for the render thread
///
/// Commands own the handles they reference, so a recorded buffer stays valid
/// even if the scene drops the resource before the frame executes.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    LoadMaterialGroup(Arc<RenderMaterialGroup>),
    UnloadMaterialGroup(Arc<RenderMaterialGroup>),
    LoadMesh(RenderMesh),
    UnloadMesh(RenderMesh),
    /// Bind a target and clear it
    Begin {
        target: RenderTarget,
        resolution: UVec2,
        clear_colour: Vec4,
    },
    End,
    ApplyCamera {
        position: Vec3,
        view_projection: Mat4,
    },
    ApplyAmbientLight {
        colour: Vec3,
    },
    ApplyDirectionalLight {
        colour: Vec3,
        direction: Vec3,
        light_view_projection: Mat4,
        shadow_tolerance: f32,
        shadow_map: Option<ShadowMapId>,
    },
    ApplyPointLight {
        colour: Vec3,
        position: Vec3,
        attenuation: Vec3,
    },
    ApplyMaterial(RenderMaterial),
    ApplyMesh(RenderMesh),
    /// Upload and bind per-frame mesh data
    ApplyDynamicMesh(RenderMesh),
    RenderInstance {
        world_matrix: Mat4,
    },
    PushDebugGroup(String),
    PopDebugGroup,
}

impl RenderCommand {
    /// Variant name, for logging and statistics
    pub fn name(&self) -> &'static str {
        match self {
            RenderCommand::LoadMaterialGroup(_) => "LoadMaterialGroup",
            RenderCommand::UnloadMaterialGroup(_) => "UnloadMaterialGroup",
            RenderCommand::LoadMesh(_) => "LoadMesh",
            RenderCommand::UnloadMesh(_) => "UnloadMesh",
            RenderCommand::Begin { .. } => "Begin",
            RenderCommand::End => "End",
            RenderCommand::ApplyCamera { .. } => "ApplyCamera",
            RenderCommand::ApplyAmbientLight { .. } => "ApplyAmbientLight",
            RenderCommand::ApplyDirectionalLight { .. } => "ApplyDirectionalLight",
            RenderCommand::ApplyPointLight { .. } => "ApplyPointLight",
            RenderCommand::ApplyMaterial(_) => "ApplyMaterial",
            RenderCommand::ApplyMesh(_) => "ApplyMesh",
            RenderCommand::ApplyDynamicMesh(_) => "ApplyDynamicMesh",
            RenderCommand::RenderInstance { .. } => "RenderInstance",
            RenderCommand::PushDebugGroup(_) => "PushDebugGroup",
            RenderCommand::PopDebugGroup => "PopDebugGroup",
        }
    }

    /// Whether this command creates or destroys a GPU resource
    pub fn is_resource_command(&self) -> bool {
        matches!(
            self,
            RenderCommand::LoadMaterialGroup(_)
                | RenderCommand::UnloadMaterialGroup(_)
                | RenderCommand::LoadMesh(_)
                | RenderCommand::UnloadMesh(_)
        )
    }
}
