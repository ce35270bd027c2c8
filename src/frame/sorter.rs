//! Draw ordering for render passes
//!
//! Every sort is stable and keyed on identity or depth, so the same input
//! produces the same order on every run and ties keep their input order.

use std::cmp::Ordering;

use super::{RenderCamera, RenderPassObject};

/// Orders the objects of a pass before commands are recorded
#[derive(Debug, Clone, Copy)]
pub struct RenderPassObjectSorter {
    opaque_depth_sort: bool,
}

impl Default for RenderPassObjectSorter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RenderPassObjectSorter {
    /// `opaque_depth_sort` should be off on tile-based GPUs, where hidden
    /// surface removal makes depth order irrelevant for opaque draws.
    pub fn new(opaque_depth_sort: bool) -> Self {
        Self { opaque_depth_sort }
    }

    /// Group by material to minimise state changes, then by depth (far to
    /// near), then by mesh.
    pub fn opaque_sort(&self, camera: &RenderCamera, objects: &mut Vec<RenderPassObject>) {
        if !self.opaque_depth_sort {
            objects.sort_by(|a, b| {
                a.material()
                    .id()
                    .cmp(&b.material().id())
                    .then_with(|| a.mesh().id().cmp(&b.mesh().id()))
            });
            return;
        }

        sort_with_depth(camera, objects, |(a_depth, a), (b_depth, b)| {
            a.material()
                .id()
                .cmp(&b.material().id())
                .then_with(|| b_depth.total_cmp(a_depth))
                .then_with(|| a.mesh().id().cmp(&b.mesh().id()))
        });
    }

    /// Back to front so blending composites correctly, then by mesh.
    pub fn transparent_sort(&self, camera: &RenderCamera, objects: &mut Vec<RenderPassObject>) {
        sort_with_depth(camera, objects, |(a_depth, a), (b_depth, b)| {
            b_depth
                .total_cmp(a_depth)
                .then_with(|| a.mesh().id().cmp(&b.mesh().id()))
        });
    }

    /// Explicit priority, lowest first, then by material.
    pub fn priority_sort(&self, objects: &mut [RenderPassObject]) {
        objects.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.material().id().cmp(&b.material().id()))
        });
    }
}

/// Sort with each object's depth computed once up front
fn sort_with_depth<F>(camera: &RenderCamera, objects: &mut Vec<RenderPassObject>, compare: F)
where
    F: Fn(&(f32, RenderPassObject), &(f32, RenderPassObject)) -> Ordering,
{
    let mut keyed: Vec<(f32, RenderPassObject)> = objects
        .drain(..)
        .map(|object| (camera.depth_of(object.world_matrix()), object))
        .collect();
    keyed.sort_by(compare);
    objects.extend(keyed.into_iter().map(|(_, object)| object));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BoundingSphere, MaterialDesc, RenderMaterial, RenderMesh, VertexFormat};
    use glam::{Mat4, Vec3};
    use rstest::rstest;

    fn camera() -> RenderCamera {
        RenderCamera::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    fn material(name: &str) -> RenderMaterial {
        RenderMaterial::new(MaterialDesc::new(name))
    }

    fn mesh(name: &str) -> RenderMesh {
        RenderMesh::new(name, VertexFormat::StaticMesh, 3, 3, BoundingSphere::default())
    }

    fn object(material: &RenderMaterial, mesh: &RenderMesh, depth: f32, priority: u32) -> RenderPassObject {
        RenderPassObject::new(
            material.clone(),
            mesh.clone(),
            Mat4::from_translation(Vec3::new(0.0, 0.0, depth)),
            BoundingSphere::default(),
            priority,
        )
    }

    fn depths(objects: &[RenderPassObject]) -> Vec<f32> {
        objects.iter().map(|o| o.world_matrix().w_axis.z).collect()
    }

    #[test]
    fn test_transparent_back_to_front() {
        let m = material("glass");
        let mesh = mesh("quad");
        let mut objects = vec![object(&m, &mesh, 1.0, 0), object(&m, &mesh, 5.0, 0), object(&m, &mesh, 3.0, 0)];

        RenderPassObjectSorter::default().transparent_sort(&camera(), &mut objects);
        assert_eq!(depths(&objects), [5.0, 3.0, 1.0]);
    }

    #[test]
    fn test_transparent_depth_tie_breaks_on_mesh() {
        let m = material("glass");
        let first = mesh("a");
        let second = mesh("b");
        let mut objects = vec![object(&m, &second, 2.0, 0), object(&m, &first, 2.0, 0)];

        RenderPassObjectSorter::default().transparent_sort(&camera(), &mut objects);
        assert_eq!(objects[0].mesh(), &first);
        assert_eq!(objects[1].mesh(), &second);
    }

    #[test]
    fn test_opaque_groups_by_material() {
        let a = material("a");
        let b = material("b");
        let mesh = mesh("cube");
        let mut objects = vec![
            object(&b, &mesh, 1.0, 0),
            object(&a, &mesh, 2.0, 0),
            object(&b, &mesh, 3.0, 0),
            object(&a, &mesh, 4.0, 0),
        ];

        RenderPassObjectSorter::default().opaque_sort(&camera(), &mut objects);

        let materials: Vec<_> = objects.iter().map(|o| o.material().name().to_string()).collect();
        assert_eq!(materials, ["a", "a", "b", "b"]);
        // Within a material, far to near
        assert_eq!(depths(&objects), [4.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_opaque_depth_tie_breaks_on_mesh() {
        let m = material("stone");
        let first = mesh("a");
        let second = mesh("b");
        let mut objects = vec![object(&m, &second, 2.0, 0), object(&m, &first, 2.0, 0)];

        RenderPassObjectSorter::default().opaque_sort(&camera(), &mut objects);
        assert_eq!(objects[0].mesh(), &first);
        assert_eq!(objects[1].mesh(), &second);
    }

    #[test]
    fn test_opaque_without_depth_sort() {
        let a = material("a");
        let near_mesh = mesh("first");
        let far_mesh = mesh("second");
        let mut objects = vec![object(&a, &far_mesh, 9.0, 0), object(&a, &near_mesh, 1.0, 0)];

        RenderPassObjectSorter::new(false).opaque_sort(&camera(), &mut objects);
        assert_eq!(objects[0].mesh(), &near_mesh);
        assert_eq!(objects[1].mesh(), &far_mesh);
    }

    #[rstest]
    #[case(vec![3, 1, 2], vec![1, 2, 3])]
    #[case(vec![0, 0, 0], vec![0, 0, 0])]
    #[case(vec![10, 5, 5, 0], vec![0, 5, 5, 10])]
    fn test_priority_sort(#[case] input: Vec<u32>, #[case] expected: Vec<u32>) {
        let m = material("ui");
        let mesh = mesh("sprite");
        let mut objects: Vec<_> = input.iter().map(|&p| object(&m, &mesh, 0.0, p)).collect();

        RenderPassObjectSorter::default().priority_sort(&mut objects);
        let priorities: Vec<u32> = objects.iter().map(RenderPassObject::priority).collect();
        assert_eq!(priorities, expected);
    }

    #[test]
    fn test_priority_tie_breaks_on_material() {
        let first = material("first");
        let second = material("second");
        let mesh = mesh("sprite");
        let mut objects = vec![object(&second, &mesh, 0.0, 1), object(&first, &mesh, 0.0, 1)];

        RenderPassObjectSorter::default().priority_sort(&mut objects);
        assert_eq!(objects[0].material(), &first);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let m = material("same");
        let mesh = mesh("same");
        let mut objects: Vec<_> = (0..8)
            .map(|i| {
                RenderPassObject::new(
                    m.clone(),
                    mesh.clone(),
                    Mat4::from_translation(Vec3::new(i as f32, 0.0, 1.0)),
                    BoundingSphere::default(),
                    0,
                )
            })
            .collect();
        let expected: Vec<f32> = objects.iter().map(|o| o.world_matrix().w_axis.x).collect();

        let sorter = RenderPassObjectSorter::default();
        sorter.opaque_sort(&camera(), &mut objects);
        sorter.transparent_sort(&camera(), &mut objects);
        sorter.priority_sort(&mut objects);

        let actual: Vec<f32> = objects.iter().map(|o| o.world_matrix().w_axis.x).collect();
        assert_eq!(actual, expected);
    }
}
