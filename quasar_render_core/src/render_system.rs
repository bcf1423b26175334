/// Render system — the top-level per-frame driver.
///
/// Owns the render context (device, layer manager, dynamic buffer
/// allocator), the render hierarchy and the pass manager, and glues them
/// together: object updates complete before clipping, clipping completes
/// before any pass reads batch arrays, and the dynamic allocator's fence
/// check brackets the frame.
///
/// There are no global singletons here: the context is an explicit object
/// passed by reference through the call chain.

use std::sync::Arc;
use glam::Mat4;
use crate::buffer::{DynamicBufferAllocator, DynamicBufferConfig};
use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::{CommandList, GraphicsDevice};
use crate::pass::{PassManager, RenderLayerManager, ScenePass};
use crate::scene::{RenderHierarchy, RenderObject, RenderObjectKey};

/// Shared render state owned by the render system and passed by reference
/// wherever subsystems need it.
pub struct RenderContext {
    pub device: Arc<dyn GraphicsDevice>,
    pub layer_manager: RenderLayerManager,
    pub dynamic_buffers: DynamicBufferAllocator,
    frame_index: u64,
}

impl RenderContext {
    pub fn new(device: Arc<dyn GraphicsDevice>, buffer_config: DynamicBufferConfig) -> Self {
        Self {
            layer_manager: RenderLayerManager::with_default_layers(),
            dynamic_buffers: DynamicBufferAllocator::new(Arc::clone(&device), buffer_config),
            device,
            frame_index: 0,
        }
    }

    /// Frames rendered so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// Top-level per-frame driver.
pub struct RenderSystem {
    context: RenderContext,
    hierarchy: RenderHierarchy,
    passes: PassManager,
}

impl RenderSystem {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            context: RenderContext::new(device, DynamicBufferConfig::default()),
            hierarchy: RenderHierarchy::new(),
            passes: PassManager::new(),
        }
    }

    // ===== SUBSYSTEM ACCESS =====

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    pub fn hierarchy(&self) -> &RenderHierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut RenderHierarchy {
        &mut self.hierarchy
    }

    /// Register a pass with the frame's pass manager.
    pub fn add_pass(&mut self, pass: Box<dyn ScenePass>) {
        self.passes.add_pass(pass);
    }

    pub fn pass_count(&self) -> usize {
        self.passes.pass_count()
    }

    // ===== OBJECT LIFECYCLE (forwarded to the hierarchy) =====

    pub fn add_render_object(&mut self, object: RenderObject) -> RenderObjectKey {
        self.hierarchy.add_render_object(object)
    }

    pub fn remove_render_object(&mut self, key: RenderObjectKey) -> Option<RenderObject> {
        self.hierarchy.remove_render_object(key)
    }

    pub fn object_updated(&mut self, key: RenderObjectKey) {
        self.hierarchy.object_updated(key)
    }

    pub fn set_world_transform(&mut self, key: RenderObjectKey, transform: Mat4) -> bool {
        self.hierarchy.set_world_transform(key, transform)
    }

    // ===== FRAME DRIVER =====

    /// Render one frame: recycle transient buffers, flush hierarchy updates,
    /// run every pass in priority order, then fence this frame's buffers.
    pub fn render_frame(&mut self, camera: &Camera, cmd: &mut dyn CommandList) -> Result<()> {
        self.context.frame_index += 1;
        self.context.dynamic_buffers.begin_frame();

        cmd.begin()?;

        // Registration/removal and transform updates settle before any clip
        self.hierarchy.update();

        self.passes.draw_all(
            &mut self.hierarchy,
            &self.context.layer_manager,
            camera,
            cmd,
        )?;

        cmd.end()?;

        self.context.dynamic_buffers.end_frame();
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
