//! Mesh handles

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(0);

/// Vertex layout of a mesh
///
/// Material groups provide one set of material variants per vertex format,
/// since the shaders differ by input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexFormat {
    /// Position, normal, uv
    StaticMesh,
    /// Position, normal, uv, joint indices, joint weights
    AnimatedMesh,
    /// Position, uv, colour
    Sprite,
}

impl VertexFormat {
    /// Size of one vertex in bytes
    pub fn stride(&self) -> usize {
        match self {
            VertexFormat::StaticMesh => 32,
            VertexFormat::AnimatedMesh => 52,
            VertexFormat::Sprite => std::mem::size_of::<SpriteVertex>(),
        }
    }
}

/// Vertex used by [`VertexFormat::Sprite`] meshes
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub colour: [u8; 4],
}

/// Identity of a mesh, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Bounding sphere used for culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
        }
    }
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Transform into another space, scaling the radius by the largest axis scale
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let (scale, _, _) = matrix.to_scale_rotation_translation();
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * scale.abs().max_element(),
        }
    }

    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

#[derive(Debug)]
struct DynamicMeshData {
    vertices: Vec<u8>,
    indices: Vec<u16>,
}

struct MeshData {
    id: MeshId,
    name: String,
    vertex_format: VertexFormat,
    vertex_count: u32,
    index_count: u32,
    bounds: BoundingSphere,
    dynamic: Option<DynamicMeshData>,
}

/// Shared handle to a mesh
///
/// Cloning is cheap. Two handles compare equal when they refer to the same
/// mesh, regardless of contents.
#[derive(Clone)]
pub struct RenderMesh(Arc<MeshData>);

impl RenderMesh {
    /// Describe a static mesh whose data lives on the GPU once loaded
    pub fn new(
        name: impl Into<String>,
        vertex_format: VertexFormat,
        vertex_count: u32,
        index_count: u32,
        bounds: BoundingSphere,
    ) -> Self {
        Self(Arc::new(MeshData {
            id: MeshId::next(),
            name: name.into(),
            vertex_format,
            vertex_count,
            index_count,
            bounds,
            dynamic: None,
        }))
    }

    pub fn id(&self) -> MeshId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn vertex_format(&self) -> VertexFormat {
        self.0.vertex_format
    }

    pub fn vertex_count(&self) -> u32 {
        self.0.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.0.index_count
    }

    /// Bounds in local space
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.0.bounds
    }

    /// Whether this mesh was built from per-frame data
    pub fn is_dynamic(&self) -> bool {
        self.0.dynamic.is_some()
    }

    /// Raw vertex bytes of a dynamic mesh
    pub fn vertex_data(&self) -> Option<&[u8]> {
        self.0.dynamic.as_ref().map(|d| d.vertices.as_slice())
    }

    /// Indices of a dynamic mesh
    pub fn index_data(&self) -> Option<&[u16]> {
        self.0.dynamic.as_ref().map(|d| d.indices.as_slice())
    }
}

impl PartialEq for RenderMesh {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for RenderMesh {}

impl fmt::Debug for RenderMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderMesh")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("vertex_format", &self.0.vertex_format)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

/// Mesh data built on the main thread for a single frame
///
/// Used for sprites, text and other geometry that changes every frame. The
/// snapshot takes ownership and the command buffer for that frame keeps it
/// alive until the frame has been executed.
#[derive(Debug)]
pub struct RenderDynamicMesh {
    vertex_format: VertexFormat,
    vertices: Vec<u8>,
    indices: Vec<u16>,
    bounds: BoundingSphere,
}

impl RenderDynamicMesh {
    /// Build from typed vertices
    ///
    /// # Panics
    ///
    /// Panics if the size of `V` does not match the stride of `vertex_format`.
    pub fn new<V: Pod>(
        vertex_format: VertexFormat,
        vertices: &[V],
        indices: Vec<u16>,
        bounds: BoundingSphere,
    ) -> Self {
        assert_eq!(
            std::mem::size_of::<V>(),
            vertex_format.stride(),
            "vertex type does not match {vertex_format:?} stride"
        );
        Self {
            vertex_format,
            vertices: bytemuck::cast_slice(vertices).to_vec(),
            indices,
            bounds,
        }
    }

    pub fn vertex_format(&self) -> VertexFormat {
        self.vertex_format
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / self.vertex_format.stride()) as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub(crate) fn into_render_mesh(self) -> RenderMesh {
        let vertex_count = self.vertex_count();
        let index_count = self.index_count();
        RenderMesh(Arc::new(MeshData {
            id: MeshId::next(),
            name: String::from("dynamic"),
            vertex_format: self.vertex_format,
            vertex_count,
            index_count,
            bounds: self.bounds,
            dynamic: Some(DynamicMeshData {
                vertices: self.vertices,
                indices: self.indices,
            }),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<SpriteVertex> {
        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .map(|&[x, y]| SpriteVertex {
                position: [x, y, 0.0],
                uv: [x, y],
                colour: [255; 4],
            })
            .collect()
    }

    #[test]
    fn test_mesh_identity() {
        let a = RenderMesh::new("a", VertexFormat::StaticMesh, 3, 3, BoundingSphere::default());
        let b = RenderMesh::new("a", VertexFormat::StaticMesh, 3, 3, BoundingSphere::default());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_sprite_stride() {
        assert_eq!(VertexFormat::Sprite.stride(), 24);
    }

    #[test]
    fn test_dynamic_mesh() {
        let dynamic = RenderDynamicMesh::new(
            VertexFormat::Sprite,
            &quad(),
            vec![0, 1, 2, 0, 2, 3],
            BoundingSphere::new(Vec3::new(0.5, 0.5, 0.0), 0.75),
        );
        assert_eq!(dynamic.vertex_count(), 4);
        assert_eq!(dynamic.index_count(), 6);

        let mesh = dynamic.into_render_mesh();
        assert!(mesh.is_dynamic());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertex_data().map(<[u8]>::len), Some(4 * 24));
        assert_eq!(mesh.index_data(), Some(&[0u16, 1, 2, 0, 2, 3][..]));
    }

    #[test]
    #[should_panic(expected = "stride")]
    fn test_dynamic_mesh_wrong_stride() {
        let _ = RenderDynamicMesh::new(
            VertexFormat::StaticMesh,
            &quad(),
            vec![0, 1, 2],
            BoundingSphere::default(),
        );
    }

    #[test]
    fn test_bounding_sphere_transform() {
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -10.0),
        );
        let moved = sphere.transformed(&matrix);
        assert_eq!(moved.center, Vec3::new(0.0, 0.0, -10.0));
        assert!((moved.radius - 3.0).abs() < 1e-5);
        assert!(!sphere.intersects(&moved));
        assert!(moved.intersects(&BoundingSphere::new(Vec3::new(0.0, 0.0, -6.5), 1.0)));
    }
}
