/// Pass manager — ordered execution of the frame's rendering sub-pipelines.
///
/// Passes run in ascending priority; auxiliary producers (shadow cascades,
/// water reflection/refraction) take lower priorities than the passes that
/// sample their outputs, which makes the within-frame producer/consumer
/// dependency explicit.

use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::CommandList;
use crate::scene::RenderHierarchy;
use super::render_layer::RenderLayerManager;

/// One full clip → sort → draw sub-pipeline.
pub trait ScenePass: Send + Sync {
    /// Pass name (materials resolve state against it)
    fn name(&self) -> &str;

    /// Draw order among passes; lower runs earlier
    fn priority(&self) -> i32;

    /// Execute the pass for this frame.
    fn draw(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        cmd: &mut dyn CommandList,
    ) -> Result<()>;
}

/// Owns the frame's passes in priority order.
pub struct PassManager {
    passes: Vec<Box<dyn ScenePass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Register a pass. Order among equal priorities is registration order.
    pub fn add_pass(&mut self, pass: Box<dyn ScenePass>) {
        self.passes.push(pass);
        self.passes.sort_by_key(|p| p.priority());
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Pass names in draw order (diagnostics).
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass once, in priority order.
    pub fn draw_all(
        &mut self,
        hierarchy: &mut RenderHierarchy,
        layer_manager: &RenderLayerManager,
        camera: &Camera,
        cmd: &mut dyn CommandList,
    ) -> Result<()> {
        for pass in &mut self.passes {
            pass.draw(hierarchy, layer_manager, camera, cmd)?;
        }
        Ok(())
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
