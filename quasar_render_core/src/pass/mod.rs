/// Pass module — render layers, passes and the pass manager.

mod pass_manager;
mod render_layer;
mod render_pass;
mod shadow_pass;
mod water_pass;

pub use pass_manager::{PassManager, ScenePass};
pub use render_layer::{LayerId, LayerMask, RenderLayer, RenderLayerManager, LAYER_COUNT};
pub use render_pass::{LayerBatchSet, PassConfig, RenderPass};
pub use shadow_pass::ShadowCascadePass;
pub use water_pass::WaterPass;
