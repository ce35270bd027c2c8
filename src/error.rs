//! Render pipeline error types
//!
//! Contract violations (claiming a snapshot field twice, writing to a sealed
//! command buffer, indexing past the material slot count) panic instead of
//! returning one of these. Errors here describe resources or services that
//! may legitimately be unavailable at runtime.

use thiserror::Error;

use crate::resources::VertexFormat;

/// Render pipeline error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Material group '{group}' has no materials for vertex format {format:?}")]
    UnsupportedVertexFormat { group: String, format: VertexFormat },
    #[error("Directional light {light_index} casts shadows but has no shadow map target")]
    MissingShadowMap { light_index: usize },
    #[error("Task scheduler has been shut down")]
    SchedulerShutDown,
    #[error("Task was dropped before producing a result")]
    TaskDropped,
    #[error("Command processor failed: {0}")]
    Processor(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
