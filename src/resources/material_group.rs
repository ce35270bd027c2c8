//! Material groups
//!
//! A [`RenderMaterialGroup`] bundles every material variant a renderable
//! needs: one variant per render pass, per vertex format. The frame compiler
//! looks variants up by the mesh's [`VertexFormat`] and the pass being built.

use crate::error::{RenderError, RenderResult};

use super::{RenderMaterial, VertexFormat};

/// Number of material slots per vertex format
pub const NUM_MATERIAL_SLOTS: usize = 6;

/// Material slot a render pass draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialSlot {
    ShadowMap,
    Base,
    DirectionalLight,
    DirectionalLightShadows,
    PointLight,
    Transparent,
}

impl MaterialSlot {
    pub const ALL: [MaterialSlot; NUM_MATERIAL_SLOTS] = [
        MaterialSlot::ShadowMap,
        MaterialSlot::Base,
        MaterialSlot::DirectionalLight,
        MaterialSlot::DirectionalLightShadows,
        MaterialSlot::PointLight,
        MaterialSlot::Transparent,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone)]
struct MaterialCollection {
    vertex_format: VertexFormat,
    materials: [Option<RenderMaterial>; NUM_MATERIAL_SLOTS],
}

/// Immutable bundle of material variants keyed by vertex format and pass
///
/// Groups are shared between the main thread and compile tasks behind an
/// `Arc`; the GPU side is created and destroyed only through load and
/// unload commands.
#[derive(Debug)]
pub struct RenderMaterialGroup {
    name: String,
    collections: Vec<MaterialCollection>,
}

impl RenderMaterialGroup {
    pub fn builder(name: impl Into<String>) -> RenderMaterialGroupBuilder {
        RenderMaterialGroupBuilder {
            name: name.into(),
            collections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex formats this group has materials for
    pub fn vertex_formats(&self) -> impl Iterator<Item = VertexFormat> + '_ {
        self.collections.iter().map(|c| c.vertex_format)
    }

    /// Every material in the group, for resource upload
    pub fn materials(&self) -> impl Iterator<Item = &RenderMaterial> + '_ {
        self.collections
            .iter()
            .flat_map(|c| c.materials.iter().flatten())
    }

    /// Look up the material for a vertex format and pass index
    ///
    /// Returns `Ok(None)` when the format is supported but the slot is empty,
    /// meaning objects using this group are skipped by that pass.
    ///
    /// # Panics
    ///
    /// Panics if `pass_index >= NUM_MATERIAL_SLOTS`.
    pub fn get_render_material(
        &self,
        vertex_format: VertexFormat,
        pass_index: usize,
    ) -> RenderResult<Option<&RenderMaterial>> {
        assert!(
            pass_index < NUM_MATERIAL_SLOTS,
            "material pass index {pass_index} out of range (max {NUM_MATERIAL_SLOTS})"
        );

        let collection = self
            .collections
            .iter()
            .find(|c| c.vertex_format == vertex_format)
            .ok_or_else(|| RenderError::UnsupportedVertexFormat {
                group: self.name.clone(),
                format: vertex_format,
            })?;

        Ok(collection.materials[pass_index].as_ref())
    }

    /// Typed variant of [`get_render_material`](Self::get_render_material)
    pub fn material_for(
        &self,
        vertex_format: VertexFormat,
        slot: MaterialSlot,
    ) -> RenderResult<Option<&RenderMaterial>> {
        self.get_render_material(vertex_format, slot.index())
    }
}

/// Builder for [`RenderMaterialGroup`]
#[derive(Debug)]
pub struct RenderMaterialGroupBuilder {
    name: String,
    collections: Vec<MaterialCollection>,
}

impl RenderMaterialGroupBuilder {
    /// Set the material for one vertex format and pass index
    ///
    /// # Panics
    ///
    /// Panics if `pass_index >= NUM_MATERIAL_SLOTS`.
    pub fn with_material(
        mut self,
        vertex_format: VertexFormat,
        pass_index: usize,
        material: RenderMaterial,
    ) -> Self {
        assert!(
            pass_index < NUM_MATERIAL_SLOTS,
            "material pass index {pass_index} out of range (max {NUM_MATERIAL_SLOTS})"
        );

        let position = self
            .collections
            .iter()
            .position(|c| c.vertex_format == vertex_format);
        let collection = match position {
            Some(index) => &mut self.collections[index],
            None => {
                self.collections.push(MaterialCollection {
                    vertex_format,
                    materials: Default::default(),
                });
                let last = self.collections.len() - 1;
                &mut self.collections[last]
            }
        };
        collection.materials[pass_index] = Some(material);
        self
    }

    pub fn with_slot(self, vertex_format: VertexFormat, slot: MaterialSlot, material: RenderMaterial) -> Self {
        self.with_material(vertex_format, slot.index(), material)
    }

    pub fn build(self) -> RenderMaterialGroup {
        RenderMaterialGroup {
            name: self.name,
            collections: self.collections,
        }
    }
}
