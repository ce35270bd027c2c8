//! Ember Render - A snapshot-driven render command pipeline
//!
//! The main thread captures scene state into a [`RenderSnapshot`]. The
//! [`Renderer`] claims it and compiles it on a worker into a [`RenderFrame`]
//! and then a sealed [`RenderCommandBuffer`], which the render thread
//! executes in slot order through a [`RenderCommandProcessor`].
//!
//! # Features
//! - Claim-once snapshots, so frame data has exactly one consumer
//! - Material-grouped opaque, back-to-front transparent and priority sorting
//! - Frustum culling, per-light passes and optional shadow map targets
//! - Pre-sized command buffers recorded in parallel without locks
//! - Deferred load/unload of material groups and meshes
//! - Entity Component System (ECS) scene extraction using Bevy ECS

pub mod commands;
pub mod error;
pub mod frame;
pub mod pool;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod tasks;

// Re-export Bevy ECS prelude for users
pub use bevy_ecs::prelude::*;

pub use commands::{
    RenderCommand, RenderCommandBuffer, RenderCommandList, RenderCommandProcessor, StatisticsCommandProcessor,
};
pub use error::{RenderError, RenderResult};
pub use frame::{RenderFrame, RenderSnapshot};
pub use renderer::Renderer;
pub use tasks::{TaskScheduler, TaskType};

/// Optional hardware features the pipeline adapts to
///
/// A missing capability changes what gets compiled; it is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCapabilities {
    /// Depth textures are available, so directional lights may cast shadows
    pub shadow_maps: bool,
    /// Sort opaque draws by depth within a material; disable on tile-based GPUs
    pub opaque_depth_sort: bool,
}

impl Default for RenderCapabilities {
    fn default() -> Self {
        Self {
            shadow_maps: true,
            opaque_depth_sort: true,
        }
    }
}

impl RenderCapabilities {
    pub fn with_shadow_maps(mut self, enabled: bool) -> Self {
        self.shadow_maps = enabled;
        self
    }

    pub fn with_opaque_depth_sort(mut self, enabled: bool) -> Self {
        self.opaque_depth_sort = enabled;
        self
    }
}

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Upper bound on scoped threads recording command slots per frame
    pub max_recording_threads: usize,
    /// Commands reserved in a freshly allocated command list
    pub command_list_capacity: usize,
    /// Released command lists kept for reuse
    pub max_pooled_command_lists: usize,
    /// Hardware features to compile for
    pub capabilities: RenderCapabilities,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_recording_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            command_list_capacity: 256,
            max_pooled_command_lists: 256,
            capabilities: RenderCapabilities::default(),
        }
    }
}

impl RendererConfig {
    pub fn with_max_recording_threads(mut self, threads: usize) -> Self {
        self.max_recording_threads = threads;
        self
    }

    pub fn with_command_list_capacity(mut self, capacity: usize) -> Self {
        self.command_list_capacity = capacity;
        self
    }

    pub fn with_capabilities(mut self, capabilities: RenderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}
