//! Renderer orchestration
//!
//! The [`Renderer`] sits between the main thread and the render thread:
//!
//! 1. `process_render_snapshot` (main thread) claims a snapshot and schedules
//!    its compilation as a small task.
//! 2. The task compiles a [`RenderFrame`], records a sealed command buffer
//!    and files it under the snapshot's frame index.
//! 3. `process_render_command_queue` (render thread) executes buffers in
//!    frame-index order, so frames whose compile tasks finish out of order
//!    are still presented in the order they were captured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::commands::{FrameAllocator, RenderCommandBuffer, RenderCommandCompiler, RenderCommandList, RenderCommandProcessor};
use crate::error::RenderResult;
use crate::frame::{FrameInputs, RenderFrame, RenderFrameCompiler, RenderSnapshot};
use crate::resources::RenderMesh;
use crate::tasks::{TaskHandle, TaskScheduler, TaskType};
use crate::RendererConfig;

/// Compiled buffers waiting for the render thread, keyed by frame index
///
/// `None` marks a frame that produced nothing to execute.
#[derive(Default)]
struct FrameQueue {
    next_to_execute: u64,
    ready: BTreeMap<u64, Option<RenderCommandBuffer>>,
}

/// Claimed resource commands and per-frame meshes of one snapshot
struct FrameResources {
    pre_render_commands: RenderCommandList,
    post_render_commands: RenderCommandList,
    dynamic_meshes: Vec<RenderMesh>,
    allocator: Arc<FrameAllocator>,
}

impl FrameResources {
    fn compile(self, frame: &RenderFrame, compiler: &RenderCommandCompiler) -> RenderCommandBuffer {
        compiler.compile_render_commands(
            frame,
            self.pre_render_commands,
            self.post_render_commands,
            self.dynamic_meshes,
            self.allocator,
        )
    }

    /// Buffer with only the pre and post lists, for frames that draw nothing
    fn into_resource_only_buffer(self) -> RenderCommandBuffer {
        let mut buffer = RenderCommandBuffer::new(2, self.allocator, self.dynamic_meshes);
        buffer.render_command_list_mut(0).append(self.pre_render_commands);
        buffer.render_command_list_mut(1).append(self.post_render_commands);
        buffer.seal();
        buffer
    }
}

/// Files a frame's buffer in the queue exactly once
///
/// The ticket owns the frame's resource commands until they are recorded.
/// If it is dropped unfiled, because scheduling failed or the compile task
/// panicked, it files them on their own so resource loads are never lost.
struct FrameTicket {
    queue: Arc<Mutex<FrameQueue>>,
    frame_index: u64,
    resources: Option<FrameResources>,
    filed: bool,
}

impl FrameTicket {
    fn file_compiled(mut self, frame: &RenderFrame, compiler: &RenderCommandCompiler) {
        let buffer = self.resources.take().map(|resources| resources.compile(frame, compiler));
        self.insert(buffer);
    }

    fn file_resources_only(mut self) {
        let buffer = self.resources.take().map(FrameResources::into_resource_only_buffer);
        self.insert(buffer);
    }

    fn insert(&mut self, buffer: Option<RenderCommandBuffer>) {
        self.queue.lock().ready.insert(self.frame_index, buffer);
        self.filed = true;
    }
}

impl Drop for FrameTicket {
    fn drop(&mut self) {
        if !self.filed {
            log::error!("Frame {} was abandoned before compiling", self.frame_index);
            let buffer = self.resources.take().map(FrameResources::into_resource_only_buffer);
            self.insert(buffer);
        }
    }
}

/// Top-level render pipeline orchestrator
///
/// All methods take `&self`, so one renderer can be shared between the main
/// thread (submitting snapshots) and the render thread (executing buffers).
pub struct Renderer {
    config: RendererConfig,
    scheduler: Arc<TaskScheduler>,
    allocator: Arc<FrameAllocator>,
    frame_compiler: RenderFrameCompiler,
    command_compiler: RenderCommandCompiler,
    queue: Arc<Mutex<FrameQueue>>,
    next_frame_index: AtomicU64,
}

impl Renderer {
    pub fn new(config: RendererConfig, scheduler: Arc<TaskScheduler>) -> Self {
        log::info!(
            "Creating renderer (shadow maps: {}, opaque depth sort: {}, recording threads: {})",
            config.capabilities.shadow_maps,
            config.capabilities.opaque_depth_sort,
            config.max_recording_threads
        );
        Self {
            allocator: Arc::new(FrameAllocator::new(
                config.command_list_capacity,
                config.max_pooled_command_lists,
            )),
            frame_compiler: RenderFrameCompiler::new(config.capabilities),
            command_compiler: RenderCommandCompiler::new(config.max_recording_threads),
            queue: Arc::new(Mutex::new(FrameQueue::default())),
            next_frame_index: AtomicU64::new(0),
            config,
            scheduler,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Claim a snapshot and compile it in the background
    ///
    /// Every field is claimed before this returns. The handle yields the
    /// compiled frame; it may be dropped if the caller does not need it.
    pub fn process_render_snapshot(
        &self,
        mut snapshot: RenderSnapshot,
    ) -> RenderResult<TaskHandle<RenderResult<Arc<RenderFrame>>>> {
        let inputs = FrameInputs {
            resolution: snapshot.resolution(),
            clear_colour: snapshot.clear_colour(),
            camera: snapshot.claim_render_camera(),
            ambient_lights: snapshot.claim_ambient_lights(),
            directional_lights: snapshot.claim_directional_lights(),
            point_lights: snapshot.claim_point_lights(),
            render_objects: snapshot.claim_render_objects(),
        };
        let resources = FrameResources {
            dynamic_meshes: snapshot.claim_render_dynamic_meshes(),
            pre_render_commands: snapshot.claim_pre_render_command_list(),
            post_render_commands: snapshot.claim_post_render_command_list(),
            allocator: self.allocator.clone(),
        };

        let frame_index = self.next_frame_index.fetch_add(1, Ordering::AcqRel);
        let ticket = FrameTicket {
            queue: self.queue.clone(),
            frame_index,
            resources: Some(resources),
            filed: false,
        };
        log::trace!(
            "Claimed snapshot for frame {frame_index} ({} objects)",
            inputs.render_objects.len()
        );

        let frame_compiler = self.frame_compiler;
        let command_compiler = self.command_compiler;

        // On failure the closure, and with it the ticket, is dropped, which
        // files the frame's resource commands.
        self.scheduler.spawn(TaskType::Small, move || {
            match frame_compiler.compile_render_frame(inputs) {
                Ok(frame) => {
                    let frame = Arc::new(frame);
                    ticket.file_compiled(&frame, &command_compiler);
                    Ok(frame)
                }
                Err(err) => {
                    log::error!("Failed to compile frame {frame_index}: {err}");
                    ticket.file_resources_only();
                    Err(err)
                }
            }
        })
    }

    /// Execute the next compiled frame, if it is ready
    ///
    /// Returns the number of buffers executed (0 or 1). Frames that produced
    /// nothing are skipped without counting.
    pub fn process_render_command_queue(&self, processor: &mut dyn RenderCommandProcessor) -> RenderResult<usize> {
        let buffer = {
            let mut queue = self.queue.lock();
            loop {
                let index = queue.next_to_execute;
                match queue.ready.remove(&index) {
                    Some(Some(buffer)) => {
                        queue.next_to_execute += 1;
                        break buffer;
                    }
                    Some(None) => {
                        log::warn!("Skipping frame {index}");
                        queue.next_to_execute += 1;
                    }
                    None => return Ok(0),
                }
            }
        };

        log::trace!("Executing {buffer:?}");
        buffer.execute(processor)?;
        Ok(1)
    }

    /// Execute every frame that is ready, in order
    pub fn drain_render_command_queue(&self, processor: &mut dyn RenderCommandProcessor) -> RenderResult<usize> {
        let mut executed = 0;
        while self.process_render_command_queue(processor)? > 0 {
            executed += 1;
        }
        Ok(executed)
    }

    /// Snapshots claimed but not yet executed
    pub fn pending_frame_count(&self) -> u64 {
        let queue = self.queue.lock();
        let submitted = self.next_frame_index.load(Ordering::Acquire);
        submitted.saturating_sub(queue.next_to_execute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::StatisticsCommandProcessor;
    use crate::error::RenderError;
    use crate::frame::{RenderCamera, RenderDirectionalLight, RenderObject, RenderPassKind};
    use crate::resources::{BoundingSphere, RenderMaterialGroupManager, VertexFormat};
    use glam::{Mat4, UVec2, Vec3, Vec4};

    fn camera() -> RenderCamera {
        RenderCamera::look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0),
        )
    }

    fn empty_resources(renderer: &Renderer) -> FrameResources {
        FrameResources {
            pre_render_commands: RenderCommandList::new(),
            post_render_commands: RenderCommandList::new(),
            dynamic_meshes: Vec::new(),
            allocator: renderer.allocator.clone(),
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(
            RendererConfig::default().with_max_recording_threads(2),
            Arc::new(TaskScheduler::new(2)),
        )
    }

    #[test]
    fn test_empty_queue_executes_nothing() {
        let renderer = renderer();
        let mut processor = StatisticsCommandProcessor::new();
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 0);
        assert_eq!(renderer.pending_frame_count(), 0);
    }

    #[test]
    fn test_snapshot_to_execution() {
        let renderer = renderer();
        let manager = RenderMaterialGroupManager::new();
        let group = manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);
        let mesh = RenderMesh::new("cube", VertexFormat::StaticMesh, 24, 36, BoundingSphere::default());

        let mut snapshot = RenderSnapshot::new(UVec2::new(100, 100), Vec4::ZERO, camera());
        snapshot.add_render_object(RenderObject::new(mesh, group, Mat4::from_translation(Vec3::NEG_Z * 5.0)));
        manager.on_render_snapshot(&mut snapshot);

        let frame = renderer.process_render_snapshot(snapshot).unwrap().recv().unwrap().unwrap();
        assert_eq!(frame.target_groups().len(), 1);
        assert_eq!(renderer.pending_frame_count(), 1);

        let mut processor = StatisticsCommandProcessor::new();
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 1);
        assert_eq!(processor.stats().draw_calls, 1);
        assert_eq!(processor.stats().resource_loads, 1);
        assert_eq!(processor.stats().frames, 1);
        assert_eq!(renderer.pending_frame_count(), 0);
    }

    #[test]
    fn test_two_opaque_one_transparent_frame() {
        let renderer = renderer();
        let manager = RenderMaterialGroupManager::new();
        let opaque = manager.create_unlit_render_material_group("opaque", None, Vec4::ONE, false);
        let glass = manager.create_unlit_render_material_group("glass", None, Vec4::ONE, true);
        let mesh = RenderMesh::new("cube", VertexFormat::StaticMesh, 24, 36, BoundingSphere::default());

        let mut snapshot = RenderSnapshot::new(UVec2::new(100, 100), Vec4::ZERO, camera());
        snapshot.add_directional_light(RenderDirectionalLight::new(Vec3::ONE, Vec3::NEG_Y));
        for (group, z) in [(&opaque, -4.0), (&glass, -6.0), (&opaque, -9.0)] {
            snapshot.add_render_object(RenderObject::new(
                mesh.clone(),
                group.clone(),
                Mat4::from_translation(Vec3::new(0.0, 0.0, z)),
            ));
        }

        let frame = renderer.process_render_snapshot(snapshot).unwrap().recv().unwrap().unwrap();
        assert_eq!(frame.target_groups().len(), 1);
        let group = &frame.target_groups()[0].camera_groups()[0];

        let base = group.pass(RenderPassKind::Base).unwrap();
        assert_eq!(base.objects().len(), 2);
        assert_eq!(base.objects()[0].material().id(), base.objects()[1].material().id());
        assert_eq!(base.objects()[0].world_matrix().w_axis.z, -9.0);

        let transparent = group.pass(RenderPassKind::Transparent).unwrap();
        assert_eq!(transparent.objects().len(), 1);
        assert_eq!(transparent.objects()[0].world_matrix().w_axis.z, -6.0);
    }

    #[test]
    fn test_failed_compile_still_runs_resource_commands() {
        let renderer = renderer();
        let manager = RenderMaterialGroupManager::new();
        manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);

        let mut snapshot = RenderSnapshot::new(UVec2::new(100, 100), Vec4::ZERO, camera());
        snapshot.add_directional_light(RenderDirectionalLight::new(Vec3::ONE, Vec3::NEG_Y).with_cast_shadows(true));
        manager.on_render_snapshot(&mut snapshot);

        let result = renderer.process_render_snapshot(snapshot).unwrap().recv().unwrap();
        assert!(matches!(result, Err(RenderError::MissingShadowMap { light_index: 0 })));

        let mut processor = StatisticsCommandProcessor::new();
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 1);
        assert_eq!(processor.stats().resource_loads, 1);
        assert_eq!(processor.stats().draw_calls, 0);
    }

    #[test]
    fn test_frames_execute_in_submission_order() {
        let renderer = renderer();
        let mut handles = Vec::new();
        for width in [10, 20, 30, 40] {
            let snapshot = RenderSnapshot::new(UVec2::new(width, 10), Vec4::ZERO, camera());
            handles.push(renderer.process_render_snapshot(snapshot).unwrap());
        }
        for handle in handles {
            handle.recv().unwrap().unwrap();
        }

        struct Widths(Vec<u32>);
        impl RenderCommandProcessor for Widths {
            fn process(&mut self, command: &crate::commands::RenderCommand) -> RenderResult<()> {
                if let crate::commands::RenderCommand::Begin { resolution, .. } = command {
                    self.0.push(resolution.x);
                }
                Ok(())
            }
        }

        let mut widths = Widths(Vec::new());
        assert_eq!(renderer.drain_render_command_queue(&mut widths).unwrap(), 4);
        assert_eq!(widths.0, [10, 20, 30, 40]);
    }

    #[test]
    fn test_waits_for_earlier_frame() {
        let renderer = renderer();
        // Frame 1 is filed before frame 0 has been.
        renderer.next_frame_index.store(2, Ordering::Relaxed);
        let buffer = empty_resources(&renderer).into_resource_only_buffer();
        renderer.queue.lock().ready.insert(1, Some(buffer));

        let mut processor = StatisticsCommandProcessor::new();
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 0);

        renderer.queue.lock().ready.insert(0, None);
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 1);
        assert_eq!(renderer.pending_frame_count(), 0);
    }

    #[test]
    fn test_unscheduled_frame_still_runs_resource_commands() {
        let scheduler = Arc::new(TaskScheduler::new(1));
        let renderer = Renderer::new(RendererConfig::default(), scheduler.clone());
        let manager = RenderMaterialGroupManager::new();
        manager.create_unlit_render_material_group("u", None, Vec4::ONE, false);

        let mut snapshot = RenderSnapshot::new(UVec2::new(100, 100), Vec4::ZERO, camera());
        manager.on_render_snapshot(&mut snapshot);

        scheduler.shut_down();
        let result = renderer.process_render_snapshot(snapshot);
        assert!(matches!(result, Err(RenderError::SchedulerShutDown)));

        let mut processor = StatisticsCommandProcessor::new();
        assert_eq!(renderer.process_render_command_queue(&mut processor).unwrap(), 1);
        assert_eq!(processor.stats().resource_loads, 1);
        assert_eq!(processor.stats().draw_calls, 0);
        assert_eq!(renderer.pending_frame_count(), 0);
    }

    #[test]
    fn test_pending_count_never_underflows() {
        let renderer = renderer();
        renderer.queue.lock().next_to_execute = 3;
        assert_eq!(renderer.pending_frame_count(), 0);

        renderer.next_frame_index.store(5, Ordering::Relaxed);
        assert_eq!(renderer.pending_frame_count(), 2);
    }
}
