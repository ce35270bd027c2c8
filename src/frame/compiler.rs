//! Frame compilation
//!
//! Turns the claimed contents of a snapshot into a [`RenderFrame`]: culls
//! against the camera, resolves per-pass materials, builds lighting and
//! shadow passes, and sorts each pass. Runs on a worker thread and touches
//! nothing but its inputs.

use glam::{UVec2, Vec3, Vec4};

use crate::error::{RenderError, RenderResult};
use crate::resources::MaterialSlot;
use crate::RenderCapabilities;

use super::{
    CameraRenderPassGroup, PassLight, RenderAmbientLight, RenderCamera, RenderDirectionalLight, RenderFrame,
    RenderLayer, RenderObject, RenderPass, RenderPassKind, RenderPassObject, RenderPassObjectSorter,
    RenderPointLight, RenderTarget, ShadowMapId, TargetRenderPassGroup,
};

/// Shadow maps clear to the far plane
const SHADOW_MAP_CLEAR: Vec4 = Vec4::ONE;

/// Everything claimed from a snapshot that a frame is compiled from
#[derive(Debug)]
pub struct FrameInputs {
    pub resolution: UVec2,
    pub clear_colour: Vec4,
    pub camera: RenderCamera,
    pub ambient_lights: Vec<RenderAmbientLight>,
    pub directional_lights: Vec<RenderDirectionalLight>,
    pub point_lights: Vec<RenderPointLight>,
    pub render_objects: Vec<RenderObject>,
}

/// Compiles [`FrameInputs`] into a [`RenderFrame`]
#[derive(Debug, Clone, Copy)]
pub struct RenderFrameCompiler {
    capabilities: RenderCapabilities,
    sorter: RenderPassObjectSorter,
}

impl RenderFrameCompiler {
    pub fn new(capabilities: RenderCapabilities) -> Self {
        Self {
            capabilities,
            sorter: RenderPassObjectSorter::new(capabilities.opaque_depth_sort),
        }
    }

    pub fn compile_render_frame(&self, inputs: FrameInputs) -> RenderResult<RenderFrame> {
        let FrameInputs {
            resolution,
            clear_colour,
            camera,
            ambient_lights,
            directional_lights,
            point_lights,
            render_objects,
        } = inputs;

        let ambient = ambient_lights.iter().fold(Vec3::ZERO, |sum, light| sum + light.colour);

        let (standard, ui): (Vec<&RenderObject>, Vec<&RenderObject>) = render_objects
            .iter()
            .partition(|object| object.layer() == RenderLayer::Standard);

        let mut visible = Vec::with_capacity(standard.len());
        for object in &standard {
            if camera.frustum().contains_sphere(object.bounding_sphere()) {
                visible.push(Classified::new(object)?);
            }
        }
        log::trace!(
            "Frame culling kept {} of {} standard objects",
            visible.len(),
            standard.len()
        );

        let mut target_groups = Vec::new();
        let mut passes = Vec::new();

        let mut base = self.resolve(visible.iter().filter(|c| !c.transparent), MaterialSlot::Base)?;
        if !base.is_empty() {
            self.sorter.opaque_sort(&camera, &mut base);
            passes.push(RenderPass::new(RenderPassKind::Base, Some(PassLight::Ambient(ambient)), base));
        }

        for (light_index, light) in directional_lights.iter().enumerate() {
            let shadow_map = if self.capabilities.shadow_maps && light.cast_shadows {
                let target = light
                    .shadow_map
                    .ok_or(RenderError::MissingShadowMap { light_index })?;
                target_groups.push(self.compile_shadow_map_group(light, target.id, target.resolution, &standard)?);
                Some(target.id)
            } else {
                None
            };

            let slot = match shadow_map {
                Some(_) => MaterialSlot::DirectionalLightShadows,
                None => MaterialSlot::DirectionalLight,
            };
            let mut lit = self.resolve(visible.iter().filter(|c| !c.transparent), slot)?;
            if !lit.is_empty() {
                self.sorter.opaque_sort(&camera, &mut lit);
                passes.push(RenderPass::new(
                    RenderPassKind::DirectionalLight,
                    Some(PassLight::Directional {
                        light: light.clone(),
                        shadow_map,
                    }),
                    lit,
                ));
            }
        }

        for light in &point_lights {
            let range = light.bounding_sphere();
            let in_range = visible
                .iter()
                .filter(|c| !c.transparent && c.object.bounding_sphere().intersects(&range));
            let mut lit = self.resolve(in_range, MaterialSlot::PointLight)?;
            if !lit.is_empty() {
                self.sorter.opaque_sort(&camera, &mut lit);
                passes.push(RenderPass::new(RenderPassKind::PointLight, Some(PassLight::Point(*light)), lit));
            }
        }

        let mut transparent = self.resolve(visible.iter().filter(|c| c.transparent), MaterialSlot::Transparent)?;
        if !transparent.is_empty() {
            self.sorter.transparent_sort(&camera, &mut transparent);
            passes.push(RenderPass::new(
                RenderPassKind::Transparent,
                Some(PassLight::Ambient(ambient)),
                transparent,
            ));
        }

        let mut camera_groups = vec![CameraRenderPassGroup::new(camera.clone(), passes)];
        if let Some(overlay) = self.compile_overlay_group(resolution, &ui)? {
            camera_groups.push(overlay);
        }
        target_groups.push(TargetRenderPassGroup::new(
            RenderTarget::Default,
            resolution,
            clear_colour,
            camera_groups,
        ));

        let frame = RenderFrame::new(
            resolution,
            clear_colour,
            camera,
            ambient_lights,
            directional_lights,
            point_lights,
            target_groups,
        );
        log::debug!(
            "Compiled frame: {} target groups, {} passes",
            frame.target_groups().len(),
            frame.pass_count()
        );
        Ok(frame)
    }

    /// Pass objects for every classified object with a material in `slot`
    fn resolve<'a, 'b: 'a, I>(&self, objects: I, slot: MaterialSlot) -> RenderResult<Vec<RenderPassObject>>
    where
        I: Iterator<Item = &'a Classified<'b>>,
    {
        let mut resolved = Vec::new();
        for classified in objects {
            let object = classified.object;
            if let Some(material) = object
                .material_group()
                .material_for(object.mesh().vertex_format(), slot)?
            {
                resolved.push(object.to_pass_object(material));
            }
        }
        Ok(resolved)
    }

    fn compile_shadow_map_group(
        &self,
        light: &RenderDirectionalLight,
        shadow_map: ShadowMapId,
        resolution: UVec2,
        standard: &[&RenderObject],
    ) -> RenderResult<TargetRenderPassGroup> {
        let light_camera = RenderCamera::from_view_projection(light.light_view_projection);

        let mut casters = Vec::new();
        for object in standard {
            if !light_camera.frustum().contains_sphere(object.bounding_sphere()) {
                continue;
            }
            let classified = Classified::new(object)?;
            if classified.transparent {
                continue;
            }
            if let Some(material) = object
                .material_group()
                .material_for(object.mesh().vertex_format(), MaterialSlot::ShadowMap)?
            {
                casters.push(object.to_pass_object(material));
            }
        }

        // An empty shadow map still has to be cleared before it is sampled.
        let mut passes = Vec::new();
        if !casters.is_empty() {
            self.sorter.opaque_sort(&light_camera, &mut casters);
            passes.push(RenderPass::new(RenderPassKind::ShadowMap, None, casters));
        }

        Ok(TargetRenderPassGroup::new(
            RenderTarget::ShadowMap(shadow_map),
            resolution,
            SHADOW_MAP_CLEAR,
            vec![CameraRenderPassGroup::new(light_camera, passes)],
        ))
    }

    fn compile_overlay_group(
        &self,
        resolution: UVec2,
        ui: &[&RenderObject],
    ) -> RenderResult<Option<CameraRenderPassGroup>> {
        let mut overlay = Vec::new();
        for object in ui {
            let group = object.material_group();
            let format = object.mesh().vertex_format();
            let material = match group.material_for(format, MaterialSlot::Transparent)? {
                Some(material) => Some(material),
                None => group.material_for(format, MaterialSlot::Base)?,
            };
            if let Some(material) = material {
                overlay.push(object.to_pass_object(material));
            }
        }

        if overlay.is_empty() {
            return Ok(None);
        }
        self.sorter.priority_sort(&mut overlay);
        Ok(Some(CameraRenderPassGroup::new(
            RenderCamera::orthographic_ui(resolution),
            vec![RenderPass::new(RenderPassKind::Overlay, None, overlay)],
        )))
    }
}

/// A render object tagged with whether it draws in the transparent pass
struct Classified<'a> {
    object: &'a RenderObject,
    transparent: bool,
}

impl<'a> Classified<'a> {
    /// Objects whose group fills the transparent slot are transparent
    fn new(object: &'a RenderObject) -> RenderResult<Self> {
        let transparent = object
            .material_group()
            .material_for(object.mesh().vertex_format(), MaterialSlot::Transparent)?
            .is_some();
        Ok(Self { object, transparent })
    }
}
