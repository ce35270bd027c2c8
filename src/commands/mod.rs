//! Render commands and the buffers that carry them to the render thread

mod allocator;
mod buffer;
mod command;
mod compiler;
mod list;
mod processor;

pub use allocator::*;
pub use buffer::*;
pub use command::*;
pub use compiler::*;
pub use list::*;
pub use processor::*;
