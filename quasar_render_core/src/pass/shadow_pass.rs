/// Shadow cascade pass — repeats the clip → sort → draw cycle once per
/// cascade with a distinct orthographic light camera and a viewport
/// sub-rectangle into the cascade atlas.

use glam::Vec3;
use std::sync::Arc;
use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::{
    ClearValue, CommandList, GpuTexture, GraphicsDevice, RenderTarget, Rect2D, TextureDesc,
    TextureFormat, TextureUsage, Viewport,
};
use crate::light::{build_cascades, CascadeConfig, ShadowCascade};
use crate::scene::{RenderHierarchy, RenderObjectFlags, RenderObjectKey};
use super::pass_manager::ScenePass;
use super::render_layer::{LayerId, RenderLayerManager};
use super::render_pass::{collect_layer_batches, draw_sorted_layers, LayerBatchSet};

/// Layers that cast shadows.
const SHADOW_LAYERS: [LayerId; 3] = [LayerId::Opaque, LayerId::AlphaTest, LayerId::Vegetation];

/// Directional-light cascade shadow pass.
pub struct ShadowCascadePass {
    priority: i32,
    light_direction: Vec3,
    cascade_config: CascadeConfig,
    /// Depth atlas holding all cascades side by side
    shadow_map: Arc<dyn GpuTexture>,
    target: RenderTarget,
    visibility: Vec<RenderObjectKey>,
    batch_set: LayerBatchSet,
    /// Cascades built on the last invocation (consumed by shading passes)
    cascades: Vec<ShadowCascade>,
}

impl ShadowCascadePass {
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        light_direction: Vec3,
        cascade_config: CascadeConfig,
        priority: i32,
    ) -> Result<Self> {
        let cascade_count = cascade_config.split_intervals.len() as u32;
        let size = cascade_config.shadow_map_size;
        let shadow_map = device.create_texture(&TextureDesc {
            width: size * cascade_count.max(1),
            height: size,
            format: TextureFormat::D32_SFLOAT,
            usage: TextureUsage::DepthStencil,
            mip_levels: 1,
        })?;

        Ok(Self {
            priority,
            light_direction: light_direction.normalize_or_zero(),
            cascade_config,
            target: RenderTarget { color: None, depth: Some(Arc::clone(&shadow_map)) },
            shadow_map,
            visibility: Vec::new(),
            batch_set: LayerBatchSet::new(),
            cascades: Vec::new(),
        })
    }

    /// Depth atlas sampled by shading passes.
    pub fn shadow_map(&self) -> &Arc<dyn GpuTexture> {
        &self.shadow_map
    }

    /// Cascades from the last invocation.
    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }

    pub fn set_light_direction(&mut self, direction: Vec3) {
        self.light_direction = direction.normalize_or_zero();
    }
}

impl ScenePass for ShadowCascadePass {
    fn name(&self) -> &str {
        "shadow_cascades"
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
        self.cascades = build_cascades(camera, self.light_direction, &self.cascade_config);
        if self.cascades.is_empty() {
            return Ok(());
        }

        cmd.begin_target(
            &self.target,
            &[ClearValue::DepthStencil { depth: 1.0, stencil: 0 }],
        )?;

        for cascade in &self.cascades {
            let Rect2D { x, y, width, height } = cascade.viewport;
            cmd.set_viewport(Viewport {
                x: x as f32,
                y: y as f32,
                width: width as f32,
                height: height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            })?;
            cmd.set_scissor(cascade.viewport)?;

            // Clip against the cascade's own camera, shadow casters only
            self.visibility.clear();
            hierarchy.clip(
                &cascade.camera,
                RenderObjectFlags::shadow_criteria(),
                &mut self.visibility,
            );

            collect_layer_batches(
                hierarchy,
                &self.visibility,
                &SHADOW_LAYERS,
                layer_manager,
                &mut self.batch_set,
            );

            // An empty cascade is a normal no-op
            draw_sorted_layers(
                &mut self.batch_set,
                &SHADOW_LAYERS,
                layer_manager,
                &cascade.camera,
                hierarchy,
                "shadow_cascades",
                cmd,
            )?;
        }

        cmd.end_target()
    }
}
