//! Render-side lights

use glam::{Mat4, UVec2, Vec3};

use crate::resources::BoundingSphere;

/// Identifier of a shadow map render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowMapId(pub u32);

/// Shadow map texture a directional light renders depth into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMapTarget {
    pub id: ShadowMapId,
    pub resolution: UVec2,
}

/// Uniform light applied to every lit surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderAmbientLight {
    pub colour: Vec3,
}

impl RenderAmbientLight {
    pub fn new(colour: Vec3) -> Self {
        Self { colour }
    }
}

/// Directional light, optionally casting shadows
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDirectionalLight {
    pub colour: Vec3,
    pub direction: Vec3,
    /// Orthographic view-projection used to render the shadow map
    pub light_view_projection: Mat4,
    /// Depth bias applied when sampling the shadow map
    pub shadow_tolerance: f32,
    pub cast_shadows: bool,
    pub shadow_map: Option<ShadowMapTarget>,
}

impl RenderDirectionalLight {
    pub fn new(colour: Vec3, direction: Vec3) -> Self {
        Self {
            colour,
            direction: direction.normalize(),
            light_view_projection: Mat4::IDENTITY,
            shadow_tolerance: 0.005,
            cast_shadows: false,
            shadow_map: None,
        }
    }

    /// Enable shadows, rendering into `target` from `light_view_projection`
    pub fn with_shadow_map(mut self, target: ShadowMapTarget, light_view_projection: Mat4) -> Self {
        self.cast_shadows = true;
        self.shadow_map = Some(target);
        self.light_view_projection = light_view_projection;
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }
}

/// Point light with a finite range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPointLight {
    pub colour: Vec3,
    pub position: Vec3,
    /// Constant, linear and quadratic attenuation factors
    pub attenuation: Vec3,
    pub range: f32,
}

impl RenderPointLight {
    /// Light with attenuation fitted to fall off over `range`
    pub fn new(colour: Vec3, position: Vec3, range: f32) -> Self {
        let range = range.max(f32::EPSILON);
        Self {
            colour,
            position,
            attenuation: Vec3::new(1.0, 4.5 / range, 75.0 / (range * range)),
            range,
        }
    }

    /// Sphere of influence, for culling lit objects
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.position, self.range)
    }
}
