//! Compiled frame description
//!
//! A [`RenderFrame`] is immutable once compiled. It nests passes inside
//! camera groups inside target groups, in the order they must execute:
//!
//! ```text
//! RenderFrame
//!   TargetRenderPassGroup (shadow map)       target, resolution, clear colour
//!     CameraRenderPassGroup (light camera)
//!       RenderPass ShadowMap
//!   TargetRenderPassGroup (default surface)
//!     CameraRenderPassGroup (scene camera)
//!       RenderPass Base, DirectionalLight.., PointLight.., Transparent
//!     CameraRenderPassGroup (ui camera)
//!       RenderPass Overlay
//! ```

use glam::{UVec2, Vec3, Vec4};

use super::{RenderAmbientLight, RenderCamera, RenderDirectionalLight, RenderPassObject, RenderPointLight, ShadowMapId};

/// Surface a target group renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The window or default framebuffer
    Default,
    ShadowMap(ShadowMapId),
}

/// Kind of render pass, which also determines how its objects are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    ShadowMap,
    Base,
    DirectionalLight,
    PointLight,
    Transparent,
    Overlay,
}

impl RenderPassKind {
    pub fn label(&self) -> &'static str {
        match self {
            RenderPassKind::ShadowMap => "shadow_map",
            RenderPassKind::Base => "base",
            RenderPassKind::DirectionalLight => "directional_light",
            RenderPassKind::PointLight => "point_light",
            RenderPassKind::Transparent => "transparent",
            RenderPassKind::Overlay => "overlay",
        }
    }
}

/// Light applied for the duration of a pass
#[derive(Debug, Clone, PartialEq)]
pub enum PassLight {
    Ambient(Vec3),
    Directional {
        light: RenderDirectionalLight,
        shadow_map: Option<ShadowMapId>,
    },
    Point(RenderPointLight),
}

/// Ordered draws sharing one light against one camera
#[derive(Debug, Clone)]
pub struct RenderPass {
    kind: RenderPassKind,
    light: Option<PassLight>,
    objects: Vec<RenderPassObject>,
}

impl RenderPass {
    pub fn new(kind: RenderPassKind, light: Option<PassLight>, objects: Vec<RenderPassObject>) -> Self {
        Self { kind, light, objects }
    }

    pub fn kind(&self) -> RenderPassKind {
        self.kind
    }

    pub fn light(&self) -> Option<&PassLight> {
        self.light.as_ref()
    }

    pub fn objects(&self) -> &[RenderPassObject] {
        &self.objects
    }
}

/// Passes rendered from one camera
#[derive(Debug, Clone)]
pub struct CameraRenderPassGroup {
    camera: RenderCamera,
    passes: Vec<RenderPass>,
}

impl CameraRenderPassGroup {
    pub fn new(camera: RenderCamera, passes: Vec<RenderPass>) -> Self {
        Self { camera, passes }
    }

    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    /// First pass of the given kind
    pub fn pass(&self, kind: RenderPassKind) -> Option<&RenderPass> {
        self.passes.iter().find(|p| p.kind == kind)
    }
}

/// Camera groups rendered into one target, cleared once
#[derive(Debug, Clone)]
pub struct TargetRenderPassGroup {
    target: RenderTarget,
    resolution: UVec2,
    clear_colour: Vec4,
    camera_groups: Vec<CameraRenderPassGroup>,
}

impl TargetRenderPassGroup {
    pub fn new(
        target: RenderTarget,
        resolution: UVec2,
        clear_colour: Vec4,
        camera_groups: Vec<CameraRenderPassGroup>,
    ) -> Self {
        Self {
            target,
            resolution,
            clear_colour,
            camera_groups,
        }
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn clear_colour(&self) -> Vec4 {
        self.clear_colour
    }

    pub fn camera_groups(&self) -> &[CameraRenderPassGroup] {
        &self.camera_groups
    }

    pub fn pass_count(&self) -> usize {
        self.camera_groups.iter().map(|g| g.passes.len()).sum()
    }
}

/// Everything needed to record one frame, in execution order
#[derive(Debug, Clone)]
pub struct RenderFrame {
    resolution: UVec2,
    clear_colour: Vec4,
    camera: RenderCamera,
    ambient_lights: Vec<RenderAmbientLight>,
    directional_lights: Vec<RenderDirectionalLight>,
    point_lights: Vec<RenderPointLight>,
    target_groups: Vec<TargetRenderPassGroup>,
}

impl RenderFrame {
    pub(crate) fn new(
        resolution: UVec2,
        clear_colour: Vec4,
        camera: RenderCamera,
        ambient_lights: Vec<RenderAmbientLight>,
        directional_lights: Vec<RenderDirectionalLight>,
        point_lights: Vec<RenderPointLight>,
        target_groups: Vec<TargetRenderPassGroup>,
    ) -> Self {
        Self {
            resolution,
            clear_colour,
            camera,
            ambient_lights,
            directional_lights,
            point_lights,
            target_groups,
        }
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn clear_colour(&self) -> Vec4 {
        self.clear_colour
    }

    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    pub fn ambient_lights(&self) -> &[RenderAmbientLight] {
        &self.ambient_lights
    }

    pub fn directional_lights(&self) -> &[RenderDirectionalLight] {
        &self.directional_lights
    }

    pub fn point_lights(&self) -> &[RenderPointLight] {
        &self.point_lights
    }

    pub fn target_groups(&self) -> &[TargetRenderPassGroup] {
        &self.target_groups
    }

    /// Total number of passes across all groups
    pub fn pass_count(&self) -> usize {
        self.target_groups.iter().map(TargetRenderPassGroup::pass_count).sum()
    }
}
