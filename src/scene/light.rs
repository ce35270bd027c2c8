//! Light components

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

use crate::frame::{RenderAmbientLight, RenderDirectionalLight, RenderPointLight, ShadowMapTarget};

/// Ambient light component
#[derive(Component, Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.03,
        }
    }
}

impl AmbientLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }

    pub fn to_render_light(&self) -> RenderAmbientLight {
        RenderAmbientLight::new(self.color * self.intensity)
    }
}

/// Point light component
/// Position comes from the Transform component on the same entity
#[derive(Component, Debug, Clone, Copy)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            radius: 10.0,
        }
    }
}

impl PointLight {
    pub fn new(color: Vec3, intensity: f32, radius: f32) -> Self {
        Self { color, intensity, radius }
    }

    pub fn to_render_light(&self, position: Vec3) -> RenderPointLight {
        RenderPointLight::new(self.color * self.intensity, position, self.radius)
    }
}

/// Directional light component (like the sun)
#[derive(Component, Debug, Clone)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Shadow map target and the light's view-projection into it
    pub shadows: Option<(ShadowMapTarget, Mat4)>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.5, -1.0, -0.5).normalize(),
            color: Vec3::ONE,
            intensity: 1.0,
            shadows: None,
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            intensity,
            shadows: None,
        }
    }

    pub fn with_shadows(mut self, target: ShadowMapTarget, light_view_projection: Mat4) -> Self {
        self.shadows = Some((target, light_view_projection));
        self
    }

    pub fn to_render_light(&self) -> RenderDirectionalLight {
        let light = RenderDirectionalLight::new(self.color * self.intensity, self.direction);
        match self.shadows {
            Some((target, light_view_projection)) => light.with_shadow_map(target, light_view_projection),
            None => light,
        }
    }
}
