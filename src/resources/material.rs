//! Material handles

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec4;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a material, unique for the lifetime of the process
///
/// Sorting by material groups draws that share shader and texture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle to a texture owned by the engine's resource layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Lighting model a material's shader implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingType {
    #[default]
    Unlit,
    Blinn,
    /// Depth-only output for shadow map passes
    ShadowMap,
}

/// Which faces get culled during rasterisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    None,
    Front,
    #[default]
    Back,
}

/// Blend factors applied when transparency is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Premultiplied,
}

/// Description of a material variant
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub name: String,
    pub shading: ShadingType,
    pub transparent: bool,
    pub blend_mode: BlendMode,
    pub depth_write: bool,
    pub depth_test: bool,
    pub cull_face: CullFace,
    pub colour: Vec4,
    pub texture: Option<TextureId>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            shading: ShadingType::Unlit,
            transparent: false,
            blend_mode: BlendMode::Alpha,
            depth_write: true,
            depth_test: true,
            cull_face: CullFace::Back,
            colour: Vec4::ONE,
            texture: None,
        }
    }
}

impl MaterialDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_shading(mut self, shading: ShadingType) -> Self {
        self.shading = shading;
        self
    }

    /// Enable blending; transparent materials do not write depth
    pub fn with_transparency(mut self, blend_mode: BlendMode) -> Self {
        self.transparent = true;
        self.blend_mode = blend_mode;
        self.depth_write = false;
        self
    }

    pub fn with_colour(mut self, colour: Vec4) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_cull_face(mut self, cull_face: CullFace) -> Self {
        self.cull_face = cull_face;
        self
    }

    pub fn with_depth(mut self, test: bool, write: bool) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }
}

struct MaterialData {
    id: MaterialId,
    desc: MaterialDesc,
}

/// Shared, immutable handle to one material variant
///
/// Equality is identity: two handles are equal only if they were cloned from
/// the same [`RenderMaterial::new`] call.
#[derive(Clone)]
pub struct RenderMaterial(Arc<MaterialData>);

impl RenderMaterial {
    pub fn new(desc: MaterialDesc) -> Self {
        Self(Arc::new(MaterialData {
            id: MaterialId::next(),
            desc,
        }))
    }

    pub fn id(&self) -> MaterialId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.desc.name
    }

    pub fn shading(&self) -> ShadingType {
        self.0.desc.shading
    }

    pub fn is_transparent(&self) -> bool {
        self.0.desc.transparent
    }

    pub fn desc(&self) -> &MaterialDesc {
        &self.0.desc
    }
}

impl PartialEq for RenderMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for RenderMaterial {}

impl fmt::Debug for RenderMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderMaterial")
            .field("id", &self.0.id)
            .field("name", &self.0.desc.name)
            .field("shading", &self.0.desc.shading)
            .field("transparent", &self.0.desc.transparent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparency_disables_depth_write() {
        let desc = MaterialDesc::new("glass").with_transparency(BlendMode::Alpha);
        assert!(desc.transparent);
        assert!(desc.depth_test);
        assert!(!desc.depth_write);
    }

    #[test]
    fn test_material_identity() {
        let a = RenderMaterial::new(MaterialDesc::new("a"));
        let b = RenderMaterial::new(MaterialDesc::new("a"));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), "a");
        assert!(!a.is_transparent());
    }
}
