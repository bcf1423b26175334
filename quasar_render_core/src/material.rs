/// Material contract consumed by render batches and passes.
///
/// Materials are shared: many batches may reference the same material, so
/// they are held as `Arc<dyn Material>`. The render core only needs the
/// narrow surface below — shader/state management behind it belongs to the
/// surrounding engine.

use crate::gpu::DrawPacket;
use crate::pass::LayerMask;

/// Highest material sorting key the batch arrays can represent (28 bits).
pub const MATERIAL_SORT_KEY_MAX: u32 = 0x0FFF_FFFF;

/// Material contract.
pub trait Material: Send + Sync {
    /// Sorting key for draw-order grouping. Values above
    /// [`MATERIAL_SORT_KEY_MAX`] are truncated by the batch arrays.
    fn sorting_key(&self) -> u32;

    /// Layers this material's batches are bucketed into.
    fn render_layers(&self) -> LayerMask;

    /// Lazily resolve shaders/state for a pass.
    ///
    /// Returning `false` skips the batch for this frame — not fatal.
    fn pre_build(&self, pass_name: &str) -> bool;

    /// Fill GPU draw-packet bindings for this material.
    fn bind_params(&self, packet: &mut DrawPacket);
}

/// Minimal concrete material: a sorting key, a layer mask and a flat color.
///
/// Enough for tests, debug geometry and tooling; real materials live in the
/// surrounding engine and implement [`Material`] themselves.
pub struct FlatMaterial {
    name: String,
    sorting_key: u32,
    layers: LayerMask,
    color: [f32; 4],
}

impl FlatMaterial {
    pub fn new(name: &str, sorting_key: u32, layers: LayerMask) -> Self {
        Self {
            name: name.to_string(),
            sorting_key,
            layers,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Material for FlatMaterial {
    fn sorting_key(&self) -> u32 {
        self.sorting_key
    }

    fn render_layers(&self) -> LayerMask {
        self.layers
    }

    fn pre_build(&self, _pass_name: &str) -> bool {
        true
    }

    fn bind_params(&self, packet: &mut DrawPacket) {
        packet.bind("color", self.color);
    }
}
