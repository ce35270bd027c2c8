//! Renderable resources
//!
//! Meshes, materials and material groups, plus the managers that schedule
//! their load and unload on the render thread.

mod manager;
mod material;
mod material_group;
mod mesh;

pub use manager::*;
pub use material::*;
pub use material_group::*;
pub use mesh::*;
