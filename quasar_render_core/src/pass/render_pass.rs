/// Render pass — one complete clip → sort → draw sub-pipeline.
///
/// A pass owns its transient visibility and per-layer batch arrays; both are
/// rebuilt on every invocation. Zero visible batches in any layer is a
/// normal, silent no-op — passes tolerate empty inputs every frame.

use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::{ClearValue, CommandList, RenderTarget, Viewport};
use crate::render_debug;
use crate::scene::{BatchHandle, RenderBatchArray, RenderHierarchy, RenderObjectFlags, RenderObjectKey};
use super::pass_manager::ScenePass;
use super::render_layer::{LayerId, RenderLayerManager, LAYER_COUNT};

/// Static configuration of one pass.
#[derive(Clone)]
pub struct PassConfig {
    /// Pass name, also the key materials resolve state against
    pub name: String,
    /// Draw order among passes (lower runs earlier)
    pub priority: i32,
    /// Target buffers (default = backbuffer)
    pub target: RenderTarget,
    /// Viewport covering the target
    pub viewport: Viewport,
    /// Clear values applied when the target is bound
    pub clear: Vec<ClearValue>,
    /// Flags an object must carry to enter this pass
    pub criteria: RenderObjectFlags,
}

/// One batch array per render layer.
pub struct LayerBatchSet {
    arrays: Vec<RenderBatchArray>,
}

impl LayerBatchSet {
    pub fn new() -> Self {
        Self {
            arrays: (0..LAYER_COUNT).map(|_| RenderBatchArray::new()).collect(),
        }
    }

    pub fn array(&self, id: LayerId) -> &RenderBatchArray {
        &self.arrays[id.index()]
    }

    pub fn array_mut(&mut self, id: LayerId) -> &mut RenderBatchArray {
        &mut self.arrays[id.index()]
    }

    pub fn clear_all(&mut self) {
        for array in &mut self.arrays {
            array.clear();
        }
    }

    /// Total batches across all layers.
    pub fn total_len(&self) -> usize {
        self.arrays.iter().map(|a| a.len()).sum()
    }
}

impl Default for LayerBatchSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket every batch of the visible objects into the pass's layer arrays,
/// keyed by each batch material's declared layers.
pub(crate) fn collect_layer_batches(
    hierarchy: &RenderHierarchy,
    visibility: &[RenderObjectKey],
    layers: &[LayerId],
    layer_manager: &RenderLayerManager,
    batch_set: &mut LayerBatchSet,
) {
    batch_set.clear_all();

    for &key in visibility {
        let Some(object) = hierarchy.object(key) else { continue };
        let world_center = object.world_bounding_box().center();

        for (index, batch) in object.batches().enumerate() {
            let mask = batch.material().render_layers();
            let material_key = batch.material().sorting_key();

            for &layer_id in layers {
                if !layer_manager.layer(layer_id).enabled() {
                    continue;
                }
                if !mask.contains(layer_id.mask()) {
                    continue;
                }
                batch_set.array_mut(layer_id).add(
                    BatchHandle { object: key, batch: index as u16 },
                    material_key,
                    batch.sort_key(),
                    batch.sorting_offset(),
                    world_center,
                );
            }
        }
    }
}

/// Sort each layer per its policy and emit draw packets in layer order.
///
/// A material whose `pre_build` fails skips its batch for the frame.
pub(crate) fn draw_sorted_layers(
    batch_set: &mut LayerBatchSet,
    layers: &[LayerId],
    layer_manager: &RenderLayerManager,
    camera: &Camera,
    hierarchy: &RenderHierarchy,
    pass_name: &str,
    cmd: &mut dyn CommandList,
) -> Result<()> {
    for layer in layer_manager.ordered() {
        if !layer.enabled() || !layers.contains(&layer.id()) {
            continue;
        }

        let array = batch_set.array_mut(layer.id());
        if array.is_empty() {
            continue;
        }
        array.sort(layer.sort_policy(), camera.position(), camera.direction());

        for entry in array.entries() {
            let Some(object) = hierarchy.object(entry.handle.object) else { continue };
            let Some(batch) = object.batch(entry.handle.batch as usize) else { continue };

            let material = batch.material();
            if !material.pre_build(pass_name) {
                render_debug!(
                    "quasar3d::RenderPass",
                    "material prebuild failed for pass '{}', batch skipped",
                    pass_name
                );
                continue;
            }

            let mut packet = batch.to_packet();
            material.bind_params(&mut packet);
            cmd.draw_packet(&packet)?;
        }
    }
    Ok(())
}

/// A general color pass (forward shading, deferred G-buffer fill, debug
/// overlays) over a configurable set of layers.
pub struct RenderPass {
    config: PassConfig,
    layers: Vec<LayerId>,
    visibility: Vec<RenderObjectKey>,
    batch_set: LayerBatchSet,
}

impl RenderPass {
    pub fn new(config: PassConfig, layers: Vec<LayerId>) -> Self {
        Self {
            config,
            layers,
            visibility: Vec::new(),
            batch_set: LayerBatchSet::new(),
        }
    }

    /// Forward pass over every color layer, drawing to the backbuffer.
    pub fn forward(viewport: Viewport) -> Self {
        Self::new(
            PassConfig {
                name: "forward".to_string(),
                priority: 0,
                target: RenderTarget::default(),
                viewport,
                clear: vec![
                    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
                    ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
                ],
                criteria: RenderObjectFlags::clip_criteria(),
            },
            vec![
                LayerId::Opaque,
                LayerId::AlphaTest,
                LayerId::Vegetation,
                LayerId::Water,
                LayerId::Translucent,
                LayerId::ShadowVolume,
                LayerId::Debug,
            ],
        )
    }

    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Visible objects from the last invocation (diagnostics).
    pub fn visible_count(&self) -> usize {
        self.visibility.len()
    }

    /// Step 1: clip the hierarchy against the camera.
    pub fn prepare_visibility(&mut self, hierarchy: &mut RenderHierarchy, camera: &Camera) {
        self.visibility.clear();
        hierarchy.clip(camera, self.config.criteria, &mut self.visibility);
    }

    /// Step 2: bucket visible batches into per-layer arrays.
    pub fn prepare_layer_arrays(
        &mut self,
        hierarchy: &RenderHierarchy,
        layer_manager: &RenderLayerManager,
    ) {
        collect_layer_batches(
            hierarchy,
            &self.visibility,
            &self.layers,
            layer_manager,
            &mut self.batch_set,
        );
    }

    /// Step 3: bind the target, sort layers and submit draw packets.
    pub fn draw_layers(
        &mut self,
        hierarchy: &RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        cmd.begin_target(&self.config.target, &self.config.clear)?;
        cmd.set_viewport(self.config.viewport)?;

        draw_sorted_layers(
            &mut self.batch_set,
            &self.layers,
            layer_manager,
            camera,
            hierarchy,
            &self.config.name,
            cmd,
        )?;

        cmd.end_target()
    }
}

impl ScenePass for RenderPass {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn priority(&self) -> i32 {
        self.config.priority
    }

    fn draw(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        self.prepare_visibility(hierarchy, camera);
        self.prepare_layer_arrays(hierarchy, layer_manager);
        self.draw_layers(hierarchy, layer_manager, camera, cmd)
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
