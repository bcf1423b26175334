/// Water pass — renders the scene into reflection and refraction targets
/// before the main pass samples them.
///
/// The reflection sub-pass uses the main camera mirrored across the water
/// plane; the refraction sub-pass re-renders the scene from the main camera
/// into an offscreen target. Both run only when at least one water batch is
/// visible this frame — a frame without water is a silent no-op.

use glam::Vec3;
use std::sync::Arc;
use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::{
    ClearValue, CommandList, GpuTexture, GraphicsDevice, RenderTarget, TextureDesc,
    TextureFormat, TextureUsage, Viewport,
};
use crate::scene::{RenderHierarchy, RenderObjectFlags, RenderObjectKey};
use super::pass_manager::ScenePass;
use super::render_layer::{LayerId, RenderLayerManager};
use super::render_pass::{collect_layer_batches, draw_sorted_layers, LayerBatchSet};

/// Layers mirrored into the reflection/refraction targets.
const SCENE_LAYERS: [LayerId; 3] = [LayerId::Opaque, LayerId::AlphaTest, LayerId::Vegetation];

/// Layer the water surfaces themselves live in.
const WATER_LAYER: [LayerId; 1] = [LayerId::Water];

/// Reflection/refraction producer pass for water surfaces.
pub struct WaterPass {
    priority: i32,
    /// Water plane (point + normal)
    plane_point: Vec3,
    plane_normal: Vec3,
    target_size: u32,
    reflection_texture: Arc<dyn GpuTexture>,
    refraction_texture: Arc<dyn GpuTexture>,
    reflection_target: RenderTarget,
    refraction_target: RenderTarget,
    visibility: Vec<RenderObjectKey>,
    batch_set: LayerBatchSet,
}

impl WaterPass {
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        plane_point: Vec3,
        plane_normal: Vec3,
        target_size: u32,
        priority: i32,
    ) -> Result<Self> {
        let make_target = |usage_format| -> Result<(Arc<dyn GpuTexture>, RenderTarget)> {
            let color = device.create_texture(&TextureDesc {
                width: target_size,
                height: target_size,
                format: usage_format,
                usage: TextureUsage::RenderTarget,
                mip_levels: 1,
            })?;
            let depth = device.create_texture(&TextureDesc {
                width: target_size,
                height: target_size,
                format: TextureFormat::D32_SFLOAT,
                usage: TextureUsage::DepthStencil,
                mip_levels: 1,
            })?;
            let target = RenderTarget { color: Some(Arc::clone(&color)), depth: Some(depth) };
            Ok((color, target))
        };

        let (reflection_texture, reflection_target) =
            make_target(TextureFormat::R8G8B8A8_UNORM)?;
        let (refraction_texture, refraction_target) =
            make_target(TextureFormat::R8G8B8A8_UNORM)?;

        Ok(Self {
            priority,
            plane_point,
            plane_normal: plane_normal.normalize_or_zero(),
            target_size,
            reflection_texture,
            refraction_texture,
            reflection_target,
            refraction_target,
            visibility: Vec::new(),
            batch_set: LayerBatchSet::new(),
        })
    }

    /// Reflection color target, sampled by water materials in later passes.
    pub fn reflection_texture(&self) -> &Arc<dyn GpuTexture> {
        &self.reflection_texture
    }

    /// Refraction color target.
    pub fn refraction_texture(&self) -> &Arc<dyn GpuTexture> {
        &self.refraction_texture
    }

    /// Whether any water batch is visible from the camera this frame.
    fn water_visible(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
    ) -> bool {
        self.visibility.clear();
        hierarchy.clip(camera, RenderObjectFlags::clip_criteria(), &mut self.visibility);
        collect_layer_batches(
            hierarchy,
            &self.visibility,
            &WATER_LAYER,
            layer_manager,
            &mut self.batch_set,
        );
        !self.batch_set.array(LayerId::Water).is_empty()
    }

    /// Render the scene layers from `camera` into `target`.
    fn render_scene_into(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        target: RenderTarget,
        pass_name: &str,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        self.visibility.clear();
        hierarchy.clip(camera, RenderObjectFlags::clip_criteria(), &mut self.visibility);
        collect_layer_batches(
            hierarchy,
            &self.visibility,
            &SCENE_LAYERS,
            layer_manager,
            &mut self.batch_set,
        );

        cmd.begin_target(
            &target,
            &[
                ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
            ],
        )?;
        cmd.set_viewport(Viewport::with_size(self.target_size as f32, self.target_size as f32))?;

        draw_sorted_layers(
            &mut self.batch_set,
            &SCENE_LAYERS,
            layer_manager,
            camera,
            hierarchy,
            pass_name,
            cmd,
        )?;

        cmd.end_target()
    }
}

impl ScenePass for WaterPass {
    fn name(&self) -> &str {
        "water"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn draw(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        // No water surface in view: skip the auxiliary renders entirely
        if !self.water_visible(hierarchy, layer_manager, camera) {
            return Ok(());
        }

        let mirrored = camera.reflected(self.plane_point, self.plane_normal);
        let reflection_target = self.reflection_target.clone();
        self.render_scene_into(
            hierarchy,
            layer_manager,
            &mirrored,
            reflection_target,
            "water_reflection",
            cmd,
        )?;

        let refraction_target = self.refraction_target.clone();
        self.render_scene_into(
            hierarchy,
            layer_manager,
            camera,
            refraction_target,
            "water_refraction",
            cmd,
        )
    }
}
