//! Render-side camera

use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::resources::BoundingSphere;

/// View frustum as six inward-facing planes
///
/// Each plane is `(normal, distance)` with a unit normal, so a point `p` is
/// inside when `normal.dot(p) + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract planes from a view-projection matrix with a `[0, 1]` depth range
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(|plane| {
            let length = plane.truncate().length();
            if length > f32::EPSILON {
                plane / length
            } else {
                plane
            }
        });

        Self { planes }
    }

    pub fn contains_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(sphere.center) + plane.w >= -sphere.radius)
    }
}

/// Camera state captured for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCamera {
    world_matrix: Mat4,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
}

impl RenderCamera {
    pub fn new(view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        let view_projection = projection_matrix * view_matrix;
        Self {
            world_matrix: view_matrix.inverse(),
            view_matrix,
            projection_matrix,
            view_projection,
            frustum: Frustum::from_view_projection(&view_projection),
        }
    }

    /// Camera looking from `position` towards `target`
    pub fn look_at(position: Vec3, target: Vec3, projection_matrix: Mat4) -> Self {
        Self::new(Mat4::look_at_rh(position, target, Vec3::Y), projection_matrix)
    }

    /// Camera for a precomputed view-projection, such as a light's shadow view
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        Self::new(Mat4::IDENTITY, view_projection)
    }

    /// Screen-space camera for overlays, with the origin at the bottom left
    pub fn orthographic_ui(resolution: UVec2) -> Self {
        let size = resolution.as_vec2();
        Self::new(
            Mat4::IDENTITY,
            Mat4::orthographic_rh(0.0, size.x, 0.0, size.y, -1.0, 1.0),
        )
    }

    pub fn position(&self) -> Vec3 {
        self.world_matrix.w_axis.truncate()
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Depth of an object for sorting: z of its origin in clip space
    ///
    /// Larger values are further from the camera.
    pub fn depth_of(&self, world_matrix: &Mat4) -> f32 {
        (self.view_projection * *world_matrix).w_axis.z
    }
}
