//! Frame-scoped command storage

use crate::pool::Pool;

use super::RenderCommandList;

/// Supplies command lists for command buffers and takes them back when a
/// buffer is retired
///
/// Shared between compile tasks and the render thread behind an `Arc`. In
/// steady state each frame reuses the storage the previous frames released.
#[derive(Debug)]
pub struct FrameAllocator {
    lists: Pool<RenderCommandList>,
    capacity_hint: usize,
}

impl FrameAllocator {
    /// `capacity_hint` is the number of commands reserved in a fresh list;
    /// at most `max_retained` released lists are kept.
    pub fn new(capacity_hint: usize, max_retained: usize) -> Self {
        Self {
            lists: Pool::new(max_retained),
            capacity_hint,
        }
    }

    /// An empty list with at least `capacity_hint` capacity
    pub fn acquire_list(&self) -> RenderCommandList {
        let mut list = self.lists.acquire();
        if list.capacity() < self.capacity_hint {
            list.reserve(self.capacity_hint);
        }
        list
    }

    pub fn release_list(&self, list: RenderCommandList) {
        self.lists.release(list);
    }

    /// Lists ready for reuse
    pub fn available_lists(&self) -> usize {
        self.lists.available()
    }
}
