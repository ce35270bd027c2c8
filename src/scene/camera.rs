//! Camera components

use bevy_ecs::prelude::*;
use glam::Mat4;

use crate::frame::RenderCamera;

use super::Transform;

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Projection::Orthographic {
            left: -half_w,
            right: half_w,
            bottom: -half_h,
            top: half_h,
            near,
            far,
        }
    }

    /// Projection matrix with a [0, 1] depth range
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }

    /// Match the aspect ratio of a resized viewport
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if let Projection::Perspective { aspect, .. } = self {
            *aspect = width / height.max(1.0);
        }
    }
}

/// Camera component
///
/// Placement comes from the [`Transform`] on the same entity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub projection: Projection,
}

impl Camera {
    pub fn new(projection: Projection) -> Self {
        Self { projection }
    }

    /// Render-side camera for an entity placed at `transform`
    ///
    /// Scale is ignored so it never distorts the view.
    pub fn to_render_camera(&self, transform: &Transform) -> RenderCamera {
        let view = Mat4::from_rotation_translation(transform.rotation, transform.position).inverse();
        RenderCamera::new(view, self.projection.matrix())
    }
}

/// Marks the camera whose view is captured into render snapshots
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MainCamera;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_render_camera_follows_transform() {
        let transform = Transform::from_position(Vec3::new(0.0, 2.0, 10.0)).looking_at(Vec3::new(0.0, 2.0, 0.0), Vec3::Y);
        let camera = Camera::new(Projection::perspective(60.0, 1.0, 0.1, 100.0)).to_render_camera(&transform);

        assert!((camera.position() - transform.position).length() < 1e-4);
        // A point straight ahead lands in the centre of clip space.
        let clip = *camera.view_projection() * Vec3::new(0.0, 2.0, 0.0).extend(1.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
    }

    #[test]
    fn test_set_aspect_only_touches_perspective() {
        let mut perspective = Projection::default();
        perspective.set_aspect(800.0, 400.0);
        assert!(matches!(perspective, Projection::Perspective { aspect, .. } if aspect == 2.0));

        let mut ortho = Projection::orthographic(10.0, 10.0, 0.1, 10.0);
        ortho.set_aspect(800.0, 400.0);
        assert_eq!(ortho, Projection::orthographic(10.0, 10.0, 0.1, 10.0));
    }
}
