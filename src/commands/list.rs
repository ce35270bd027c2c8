//! Command lists

use crate::pool::Poolable;

use super::RenderCommand;

/// Append-only sequence of commands owned by one buffer slot
///
/// Lists are not synchronised: whoever holds `&mut` is the only producer.
#[derive(Debug, Default)]
pub struct RenderCommandList {
    commands: Vec<RenderCommand>,
}

impl RenderCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Move every command of `other` onto the end of this list
    pub fn append(&mut self, mut other: RenderCommandList) {
        self.commands.append(&mut other.commands);
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.commands.capacity()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.commands.reserve(additional);
    }
}

impl<'a> IntoIterator for &'a RenderCommandList {
    type Item = &'a RenderCommand;
    type IntoIter = std::slice::Iter<'a, RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl Poolable for RenderCommandList {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.commands.clear();
    }
}
