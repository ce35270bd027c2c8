//! Frame capture and compilation
//!
//! [`RenderSnapshot`] is filled on the main thread; [`RenderFrameCompiler`]
//! turns its claimed contents into an immutable [`RenderFrame`] on a worker.

mod camera;
mod compiler;
mod light;
mod object;
mod render_frame;
mod snapshot;
mod sorter;

pub use camera::*;
pub use compiler::*;
pub use light::*;
pub use object::*;
pub use render_frame::*;
pub use snapshot::*;
pub use sorter::*;
