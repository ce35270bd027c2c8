//! Command execution
//!
//! A [`RenderCommandProcessor`] is the seam a GPU backend implements. The
//! buffer hands it every command in slot order on the render thread.

use crate::error::{RenderError, RenderResult};

use super::RenderCommand;

/// Executes recorded commands
pub trait RenderCommandProcessor {
    fn process(&mut self, command: &RenderCommand) -> RenderResult<()>;

    /// Called once after the last command of a buffer
    fn end_frame(&mut self) -> RenderResult<()> {
        Ok(())
    }
}

/// Counters gathered by [`StatisticsCommandProcessor`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStatistics {
    pub frames: u64,
    pub commands: u64,
    pub targets: u64,
    pub draw_calls: u64,
    pub material_changes: u64,
    pub mesh_changes: u64,
    pub dynamic_mesh_uploads: u64,
    pub resource_loads: u64,
    pub resource_unloads: u64,
}

/// Processor that validates command structure and counts work instead of
/// talking to a GPU
///
/// Useful headless, in tests, and as a reference for backend authors.
#[derive(Debug, Default)]
pub struct StatisticsCommandProcessor {
    stats: RenderStatistics,
    in_target: bool,
    debug_depth: usize,
    recorded: Option<Vec<&'static str>>,
}

impl StatisticsCommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also keep the name of every processed command
    pub fn with_recording(mut self) -> Self {
        self.recorded = Some(Vec::new());
        self
    }

    pub fn stats(&self) -> &RenderStatistics {
        &self.stats
    }

    /// Names of processed commands, if recording was enabled
    pub fn recorded(&self) -> &[&'static str] {
        self.recorded.as_deref().unwrap_or(&[])
    }
}

impl StatisticsCommandProcessor {
    fn apply(&mut self, command: &RenderCommand) -> RenderResult<()> {
        log::trace!("Processing {}", command.name());
        self.stats.commands += 1;
        if let Some(recorded) = self.recorded.as_mut() {
            recorded.push(command.name());
        }

        match command {
            RenderCommand::Begin { .. } => {
                if self.in_target {
                    return Err(RenderError::Processor("Begin inside an open target".to_string()));
                }
                self.in_target = true;
                self.stats.targets += 1;
            }
            RenderCommand::End => {
                if !self.in_target {
                    return Err(RenderError::Processor("End without Begin".to_string()));
                }
                self.in_target = false;
            }
            RenderCommand::RenderInstance { .. } => {
                if !self.in_target {
                    return Err(RenderError::Processor("draw outside of a target".to_string()));
                }
                self.stats.draw_calls += 1;
            }
            RenderCommand::ApplyMaterial(_) => self.stats.material_changes += 1,
            RenderCommand::ApplyMesh(_) => self.stats.mesh_changes += 1,
            RenderCommand::ApplyDynamicMesh(_) => {
                self.stats.mesh_changes += 1;
                self.stats.dynamic_mesh_uploads += 1;
            }
            RenderCommand::LoadMaterialGroup(_) | RenderCommand::LoadMesh(_) => self.stats.resource_loads += 1,
            RenderCommand::UnloadMaterialGroup(_) | RenderCommand::UnloadMesh(_) => {
                self.stats.resource_unloads += 1
            }
            RenderCommand::PushDebugGroup(_) => self.debug_depth += 1,
            RenderCommand::PopDebugGroup => {
                self.debug_depth = self
                    .debug_depth
                    .checked_sub(1)
                    .ok_or_else(|| RenderError::Processor("unbalanced debug group".to_string()))?;
            }
            RenderCommand::ApplyCamera { .. }
            | RenderCommand::ApplyAmbientLight { .. }
            | RenderCommand::ApplyDirectionalLight { .. }
            | RenderCommand::ApplyPointLight { .. } => {}
        }
        Ok(())
    }

    /// Forget open targets and debug groups so the next buffer starts clean
    fn reset_scopes(&mut self) {
        self.in_target = false;
        self.debug_depth = 0;
    }
}

impl RenderCommandProcessor for StatisticsCommandProcessor {
    fn process(&mut self, command: &RenderCommand) -> RenderResult<()> {
        // A rejected command aborts the buffer, so its closing commands never arrive.
        let result = self.apply(command);
        if result.is_err() {
            self.reset_scopes();
        }
        result
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let open = self.in_target || self.debug_depth != 0;
        self.reset_scopes();
        if open {
            return Err(RenderError::Processor("frame ended with open scopes".to_string()));
        }
        self.stats.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, UVec2, Vec4};

    use crate::frame::RenderTarget;

    fn begin() -> RenderCommand {
        RenderCommand::Begin {
            target: RenderTarget::Default,
            resolution: UVec2::new(8, 8),
            clear_colour: Vec4::ZERO,
        }
    }

    #[test]
    fn test_counts_draws() {
        let mut processor = StatisticsCommandProcessor::new().with_recording();
        for command in [
            begin(),
            RenderCommand::RenderInstance { world_matrix: Mat4::IDENTITY },
            RenderCommand::RenderInstance { world_matrix: Mat4::IDENTITY },
            RenderCommand::End,
        ] {
            processor.process(&command).unwrap();
        }
        processor.end_frame().unwrap();

        assert_eq!(processor.stats().draw_calls, 2);
        assert_eq!(processor.stats().targets, 1);
        assert_eq!(processor.stats().frames, 1);
        assert_eq!(processor.recorded(), ["Begin", "RenderInstance", "RenderInstance", "End"]);
    }

    #[test]
    fn test_draw_outside_target_fails() {
        let mut processor = StatisticsCommandProcessor::new();
        let result = processor.process(&RenderCommand::RenderInstance { world_matrix: Mat4::IDENTITY });
        assert!(matches!(result, Err(RenderError::Processor(_))));
    }

    #[test]
    fn test_unbalanced_scopes_fail() {
        let mut processor = StatisticsCommandProcessor::new();
        assert!(processor.process(&RenderCommand::PopDebugGroup).is_err());

        let mut processor = StatisticsCommandProcessor::new();
        processor.process(&begin()).unwrap();
        assert!(processor.end_frame().is_err());
    }

    #[test]
    fn test_recovers_after_rejected_buffer() {
        use crate::commands::{FrameAllocator, RenderCommandBuffer};
        use std::sync::Arc;

        let allocator = Arc::new(FrameAllocator::new(8, 8));
        let mut processor = StatisticsCommandProcessor::new();

        let mut broken = RenderCommandBuffer::new(1, allocator.clone(), Vec::new());
        broken.render_command_list_mut(0).push(begin());
        broken.render_command_list_mut(0).push(RenderCommand::PopDebugGroup);
        broken.seal();
        assert_eq!(
            broken.execute(&mut processor),
            Err(RenderError::Processor("unbalanced debug group".to_string()))
        );

        let mut empty = RenderCommandBuffer::new(2, allocator.clone(), Vec::new());
        empty.seal();
        empty.execute(&mut processor).unwrap();

        let mut valid = RenderCommandBuffer::new(1, allocator, Vec::new());
        valid.render_command_list_mut(0).push(begin());
        valid.render_command_list_mut(0).push(RenderCommand::End);
        valid.seal();
        valid.execute(&mut processor).unwrap();
        assert_eq!(processor.stats().frames, 2);
    }

    #[test]
    fn test_open_scopes_do_not_leak_into_next_frame() {
        let mut processor = StatisticsCommandProcessor::new();
        processor.process(&begin()).unwrap();
        assert!(processor.end_frame().is_err());
        assert!(processor.end_frame().is_ok());
    }
}
