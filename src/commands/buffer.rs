//! Command buffers
//!
//! A [`RenderCommandBuffer`] is created with a fixed number of slots, one
//! command list each. Producers fill slots in any order and on any thread,
//! each slot through its own `&mut`, so no locking is needed. Once sealed,
//! the render thread reads the slots strictly in index order.
//!
//! ```text
//! Empty ──slot access──▶ Populating ──seal()──▶ Sealed ──execute()──▶ (retired)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::RenderResult;
use crate::resources::RenderMesh;

use super::{FrameAllocator, RenderCommandList, RenderCommandProcessor};

/// Lifecycle of a [`RenderCommandBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferState {
    Empty,
    Populating,
    Sealed,
}

/// Ordered, pre-sized set of command lists for one frame
pub struct RenderCommandBuffer {
    slots: Vec<RenderCommandList>,
    allocator: Arc<FrameAllocator>,
    dynamic_meshes: Vec<RenderMesh>,
    state: CommandBufferState,
}

impl RenderCommandBuffer {
    /// Allocate `num_slots` empty lists and take ownership of the frame's
    /// dynamic meshes
    pub fn new(num_slots: usize, allocator: Arc<FrameAllocator>, dynamic_meshes: Vec<RenderMesh>) -> Self {
        let slots = (0..num_slots).map(|_| allocator.acquire_list()).collect();
        Self {
            slots,
            allocator,
            dynamic_meshes,
            state: CommandBufferState::Empty,
        }
    }

    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Meshes built for this frame only, released with the buffer
    pub fn dynamic_meshes(&self) -> &[RenderMesh] {
        &self.dynamic_meshes
    }

    /// The list for one slot
    ///
    /// # Panics
    ///
    /// Panics if the buffer is sealed or `slot` is out of range.
    pub fn render_command_list_mut(&mut self, slot: usize) -> &mut RenderCommandList {
        self.begin_populating();
        let num_slots = self.slots.len();
        match self.slots.get_mut(slot) {
            Some(list) => list,
            None => panic!("command buffer slot {slot} out of range ({num_slots} slots)"),
        }
    }

    /// Every slot at once, for handing disjoint slots to parallel producers
    ///
    /// # Panics
    ///
    /// Panics if the buffer is sealed.
    pub fn slots_mut(&mut self) -> &mut [RenderCommandList] {
        self.begin_populating();
        &mut self.slots
    }

    /// Stop accepting commands and make the queue readable
    pub fn seal(&mut self) {
        assert!(
            self.state != CommandBufferState::Sealed,
            "command buffer is already sealed"
        );
        self.state = CommandBufferState::Sealed;
    }

    /// Slots in execution order
    ///
    /// # Panics
    ///
    /// Panics if the buffer has not been sealed.
    pub fn queue(&self) -> &[RenderCommandList] {
        assert!(
            self.state == CommandBufferState::Sealed,
            "command buffer must be sealed before it is read"
        );
        &self.slots
    }

    /// Total commands across all slots
    pub fn command_count(&self) -> usize {
        self.slots.iter().map(RenderCommandList::len).sum()
    }

    /// Run every command through `processor`, slot 0 first, then retire the
    /// buffer
    ///
    /// Stops at the first command the processor rejects.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has not been sealed.
    pub fn execute(self, processor: &mut dyn RenderCommandProcessor) -> RenderResult<()> {
        for list in self.queue() {
            for command in list {
                processor.process(command)?;
            }
        }
        processor.end_frame()
    }

    fn begin_populating(&mut self) {
        match self.state {
            CommandBufferState::Empty => self.state = CommandBufferState::Populating,
            CommandBufferState::Populating => {}
            CommandBufferState::Sealed => panic!("cannot record into a sealed command buffer"),
        }
    }
}

impl Drop for RenderCommandBuffer {
    fn drop(&mut self) {
        for list in self.slots.drain(..) {
            self.allocator.release_list(list);
        }
    }
}

impl fmt::Debug for RenderCommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCommandBuffer")
            .field("slots", &self.slots.len())
            .field("commands", &self.command_count())
            .field("dynamic_meshes", &self.dynamic_meshes.len())
            .field("state", &self.state)
            .finish()
    }
}
