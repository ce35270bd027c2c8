//! Command buffer compilation
//!
//! Lays a [`RenderFrame`] out as buffer slots and records each slot:
//!
//! ```text
//! slot 0        pre-render commands (resource loads)
//! per target    Begin, one slot per pass, End
//! slot N-1      post-render commands (resource unloads)
//! ```
//!
//! Pass slots are independent, so they are recorded on scoped threads, each
//! thread owning a contiguous run of slots.

use std::sync::Arc;

use crate::frame::{PassLight, RenderCamera, RenderFrame, RenderPass, TargetRenderPassGroup};
use crate::resources::{MaterialId, MeshId, RenderMesh};

use super::{FrameAllocator, RenderCommand, RenderCommandBuffer, RenderCommandList};

/// What a slot is recorded from
enum SlotJob<'a> {
    /// Filled from a snapshot list before recording starts
    Prepared,
    Begin(&'a TargetRenderPassGroup),
    Pass {
        camera: &'a RenderCamera,
        pass: &'a RenderPass,
    },
    End,
}

/// Records a compiled frame into a sealed [`RenderCommandBuffer`]
#[derive(Debug, Clone, Copy)]
pub struct RenderCommandCompiler {
    max_threads: usize,
}

impl RenderCommandCompiler {
    /// `max_threads` bounds how many scoped threads record pass slots
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads: max_threads.max(1),
        }
    }

    pub fn compile_render_commands(
        &self,
        frame: &RenderFrame,
        pre_render_commands: RenderCommandList,
        post_render_commands: RenderCommandList,
        dynamic_meshes: Vec<RenderMesh>,
        allocator: Arc<FrameAllocator>,
    ) -> RenderCommandBuffer {
        let layout = slot_layout(frame);
        let mut buffer = RenderCommandBuffer::new(layout.len(), allocator, dynamic_meshes);

        let last = layout.len() - 1;
        buffer.render_command_list_mut(0).append(pre_render_commands);
        buffer.render_command_list_mut(last).append(post_render_commands);

        {
            let mut work: Vec<(&mut RenderCommandList, &SlotJob)> = buffer
                .slots_mut()
                .iter_mut()
                .zip(&layout)
                .filter(|(_, job)| !matches!(job, SlotJob::Prepared))
                .collect();

            let threads = self.max_threads.min(work.len()).max(1);
            if threads == 1 {
                for (list, job) in work {
                    record_slot(job, list);
                }
            } else {
                let chunk_size = work.len().div_ceil(threads);
                std::thread::scope(|s| {
                    for chunk in work.chunks_mut(chunk_size) {
                        s.spawn(move || {
                            for (list, job) in chunk.iter_mut() {
                                record_slot(job, list);
                            }
                        });
                    }
                });
            }
        }

        buffer.seal();
        log::trace!(
            "Recorded {} commands into {} slots",
            buffer.command_count(),
            buffer.num_slots()
        );
        buffer
    }
}

fn slot_layout(frame: &RenderFrame) -> Vec<SlotJob<'_>> {
    let mut layout = vec![SlotJob::Prepared];
    for target_group in frame.target_groups() {
        layout.push(SlotJob::Begin(target_group));
        for camera_group in target_group.camera_groups() {
            for pass in camera_group.passes() {
                layout.push(SlotJob::Pass {
                    camera: camera_group.camera(),
                    pass,
                });
            }
        }
        layout.push(SlotJob::End);
    }
    layout.push(SlotJob::Prepared);
    layout
}

fn record_slot(job: &SlotJob, list: &mut RenderCommandList) {
    match job {
        SlotJob::Prepared => {}
        SlotJob::Begin(group) => list.push(RenderCommand::Begin {
            target: group.target(),
            resolution: group.resolution(),
            clear_colour: group.clear_colour(),
        }),
        SlotJob::Pass { camera, pass } => record_pass(camera, pass, list),
        SlotJob::End => list.push(RenderCommand::End),
    }
}

fn record_pass(camera: &RenderCamera, pass: &RenderPass, list: &mut RenderCommandList) {
    list.push(RenderCommand::PushDebugGroup(pass.kind().label().to_string()));
    list.push(RenderCommand::ApplyCamera {
        position: camera.position(),
        view_projection: *camera.view_projection(),
    });

    match pass.light() {
        Some(PassLight::Ambient(colour)) => list.push(RenderCommand::ApplyAmbientLight { colour: *colour }),
        Some(PassLight::Directional { light, shadow_map }) => list.push(RenderCommand::ApplyDirectionalLight {
            colour: light.colour,
            direction: light.direction,
            light_view_projection: light.light_view_projection,
            shadow_tolerance: light.shadow_tolerance,
            shadow_map: *shadow_map,
        }),
        Some(PassLight::Point(light)) => list.push(RenderCommand::ApplyPointLight {
            colour: light.colour,
            position: light.position,
            attenuation: light.attenuation,
        }),
        None => {}
    }

    // Objects arrive sorted, so runs of equal material and mesh only bind once.
    let mut current_material: Option<MaterialId> = None;
    let mut current_mesh: Option<MeshId> = None;
    for object in pass.objects() {
        let material = object.material();
        if current_material != Some(material.id()) {
            list.push(RenderCommand::ApplyMaterial(material.clone()));
            current_material = Some(material.id());
            // A new shader needs its vertex inputs bound again.
            current_mesh = None;
        }

        let mesh = object.mesh();
        if current_mesh != Some(mesh.id()) {
            if mesh.is_dynamic() {
                list.push(RenderCommand::ApplyDynamicMesh(mesh.clone()));
            } else {
                list.push(RenderCommand::ApplyMesh(mesh.clone()));
            }
            current_mesh = Some(mesh.id());
        }

        list.push(RenderCommand::RenderInstance {
            world_matrix: *object.world_matrix(),
        });
    }

    list.push(RenderCommand::PopDebugGroup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{
        FrameInputs, RenderAmbientLight, RenderDirectionalLight, RenderFrameCompiler, RenderObject, RenderSnapshot,
    };
    use crate::resources::{
        BoundingSphere, RenderDynamicMesh, RenderMaterialGroupManager, SpriteVertex, VertexFormat,
    };
    use crate::RenderCapabilities;
    use glam::{Mat4, UVec2, Vec3, Vec4};

    fn camera() -> RenderCamera {
        RenderCamera::look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0),
        )
    }

    fn frame_with(objects: Vec<RenderObject>, directional: bool) -> RenderFrame {
        let directional_lights = if directional {
            vec![RenderDirectionalLight::new(Vec3::ONE, Vec3::NEG_Y)]
        } else {
            Vec::new()
        };
        RenderFrameCompiler::new(RenderCapabilities::default())
            .compile_render_frame(FrameInputs {
                resolution: UVec2::new(320, 240),
                clear_colour: Vec4::ZERO,
                camera: camera(),
                ambient_lights: vec![RenderAmbientLight::new(Vec3::splat(0.2))],
                directional_lights,
                point_lights: Vec::new(),
                render_objects: objects,
            })
            .unwrap()
    }

    fn names(buffer: &RenderCommandBuffer, slot: usize) -> Vec<&'static str> {
        buffer.queue()[slot].iter().map(RenderCommand::name).collect()
    }

    fn at(z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn test_empty_frame_layout() {
        let frame = frame_with(Vec::new(), false);
        let buffer = RenderCommandCompiler::new(1).compile_render_commands(
            &frame,
            RenderCommandList::new(),
            RenderCommandList::new(),
            Vec::new(),
            Arc::new(FrameAllocator::new(16, 16)),
        );

        // pre, Begin, End, post
        assert_eq!(buffer.num_slots(), 4);
        assert!(buffer.queue()[0].is_empty());
        assert_eq!(names(&buffer, 1), ["Begin"]);
        assert_eq!(names(&buffer, 2), ["End"]);
        assert!(buffer.queue()[3].is_empty());
    }

    #[test]
    fn test_pre_and_post_lists_bracket_the_frame() {
        let manager = RenderMaterialGroupManager::new();
        let group = manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);
        let mut snapshot = RenderSnapshot::new(UVec2::new(8, 8), Vec4::ZERO, camera());
        manager.on_render_snapshot(&mut snapshot);
        snapshot.post_render_command_list_mut().push(RenderCommand::UnloadMaterialGroup(group.clone()));

        let frame = frame_with(Vec::new(), false);
        let buffer = RenderCommandCompiler::new(2).compile_render_commands(
            &frame,
            snapshot.claim_pre_render_command_list(),
            snapshot.claim_post_render_command_list(),
            Vec::new(),
            Arc::new(FrameAllocator::new(16, 16)),
        );

        assert_eq!(names(&buffer, 0), ["LoadMaterialGroup"]);
        assert_eq!(names(&buffer, buffer.num_slots() - 1), ["UnloadMaterialGroup"]);
    }

    #[test]
    fn test_redundant_binds_are_skipped() {
        let manager = RenderMaterialGroupManager::new();
        let group = manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);
        let mesh = RenderMesh::new("cube", VertexFormat::StaticMesh, 24, 36, BoundingSphere::default());
        let objects = (0..3)
            .map(|i| RenderObject::new(mesh.clone(), group.clone(), at(-5.0 - i as f32)))
            .collect();

        let frame = frame_with(objects, false);
        let buffer = RenderCommandCompiler::new(1).compile_render_commands(
            &frame,
            RenderCommandList::new(),
            RenderCommandList::new(),
            Vec::new(),
            Arc::new(FrameAllocator::new(16, 16)),
        );

        assert_eq!(
            names(&buffer, 2),
            [
                "PushDebugGroup",
                "ApplyCamera",
                "ApplyAmbientLight",
                "ApplyMaterial",
                "ApplyMesh",
                "RenderInstance",
                "RenderInstance",
                "RenderInstance",
                "PopDebugGroup",
            ]
        );
    }

    #[test]
    fn test_dynamic_meshes_are_owned_by_buffer() {
        let manager = RenderMaterialGroupManager::new();
        let group = manager.create_unlit_render_material_group("sprites", None, Vec4::ONE, false);
        let mut snapshot = RenderSnapshot::new(UVec2::new(8, 8), Vec4::ZERO, camera());
        let mesh = snapshot.add_render_dynamic_mesh(RenderDynamicMesh::new(
            VertexFormat::Sprite,
            &[SpriteVertex::default(); 4],
            vec![0, 1, 2, 0, 2, 3],
            BoundingSphere::default(),
        ));

        let frame = frame_with(vec![RenderObject::new(mesh.clone(), group, at(-3.0))], false);
        let buffer = RenderCommandCompiler::new(1).compile_render_commands(
            &frame,
            RenderCommandList::new(),
            RenderCommandList::new(),
            snapshot.claim_render_dynamic_meshes(),
            Arc::new(FrameAllocator::new(16, 16)),
        );

        assert_eq!(buffer.dynamic_meshes(), [mesh]);
        assert!(names(&buffer, 2).contains(&"ApplyDynamicMesh"));
    }

    #[test]
    fn test_parallel_recording_matches_serial() {
        let manager = RenderMaterialGroupManager::new();
        let unlit = manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);
        let lit = manager.create_blinn_render_material_group("b", None, Vec4::ONE);
        let glass = manager.create_unlit_render_material_group("g", None, Vec4::ONE, true);
        let mesh = RenderMesh::new("cube", VertexFormat::StaticMesh, 24, 36, BoundingSphere::default());

        let objects: Vec<RenderObject> = (0..12)
            .map(|i| {
                let group = [&unlit, &lit, &glass][i % 3].clone();
                RenderObject::new(mesh.clone(), group, at(-2.0 - i as f32))
            })
            .collect();
        let frame = frame_with(objects, true);
        let allocator = Arc::new(FrameAllocator::new(16, 64));

        let record = |threads: usize| {
            let buffer = RenderCommandCompiler::new(threads).compile_render_commands(
                &frame,
                RenderCommandList::new(),
                RenderCommandList::new(),
                Vec::new(),
                allocator.clone(),
            );
            (0..buffer.num_slots())
                .map(|slot| names(&buffer, slot))
                .collect::<Vec<_>>()
        };

        let serial = record(1);
        let parallel = record(4);
        assert_eq!(serial, parallel);
        // pre, Begin, base, directional, transparent, End, post
        assert_eq!(serial.len(), 7);
    }
}
