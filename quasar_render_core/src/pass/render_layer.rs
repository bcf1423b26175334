/// Render layers — named, ordered draw buckets.
///
/// A layer groups batches that share a draw-order policy (opaque sorted
/// front-to-back, translucent back-to-front, debug in insertion order).
/// Materials declare the layers their batches belong to via a LayerMask.

use bitflags::bitflags;
use crate::scene::SortPolicy;

/// Identifier for one render layer.
///
/// The enum order is NOT the draw order; [`RenderLayerManager`] owns the
/// ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    Opaque,
    AlphaTest,
    Water,
    Translucent,
    ShadowVolume,
    Vegetation,
    Debug,
}

/// Number of render layers
pub const LAYER_COUNT: usize = 7;

impl LayerId {
    /// All layers, in the default draw order.
    pub const ALL: [LayerId; LAYER_COUNT] = [
        LayerId::Opaque,
        LayerId::AlphaTest,
        LayerId::Vegetation,
        LayerId::Water,
        LayerId::Translucent,
        LayerId::ShadowVolume,
        LayerId::Debug,
    ];

    /// Dense index for per-layer arrays.
    pub fn index(self) -> usize {
        match self {
            LayerId::Opaque => 0,
            LayerId::AlphaTest => 1,
            LayerId::Water => 2,
            LayerId::Translucent => 3,
            LayerId::ShadowVolume => 4,
            LayerId::Vegetation => 5,
            LayerId::Debug => 6,
        }
    }

    /// Single-layer mask.
    pub fn mask(self) -> LayerMask {
        LayerMask::from_bits_truncate(1 << self.index())
    }

    /// Layer name (used for pass-level logging).
    pub fn name(self) -> &'static str {
        match self {
            LayerId::Opaque => "opaque",
            LayerId::AlphaTest => "alpha_test",
            LayerId::Water => "water",
            LayerId::Translucent => "translucent",
            LayerId::ShadowVolume => "shadow_volume",
            LayerId::Vegetation => "vegetation",
            LayerId::Debug => "debug",
        }
    }
}

bitflags! {
    /// Set of layers a material's batches are bucketed into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LayerMask: u32 {
        const OPAQUE        = 1 << 0;
        const ALPHA_TEST    = 1 << 1;
        const WATER         = 1 << 2;
        const TRANSLUCENT   = 1 << 3;
        const SHADOW_VOLUME = 1 << 4;
        const VEGETATION    = 1 << 5;
        const DEBUG         = 1 << 6;
    }
}

/// One named draw bucket with its sort policy.
#[derive(Debug, Clone)]
pub struct RenderLayer {
    id: LayerId,
    sort_policy: SortPolicy,
    enabled: bool,
}

impl RenderLayer {
    pub fn new(id: LayerId, sort_policy: SortPolicy) -> Self {
        Self { id, sort_policy, enabled: true }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn sort_policy(&self) -> SortPolicy {
        self.sort_policy
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Owns the ordered layer list and per-layer sort policies.
///
/// Lives inside the render context and is passed by reference wherever
/// layers are consulted — there is no global instance.
pub struct RenderLayerManager {
    layers: Vec<RenderLayer>,
}

impl RenderLayerManager {
    /// Default layer set: opaque-ish layers front-to-back, translucent
    /// back-to-front, debug unsorted.
    pub fn with_default_layers() -> Self {
        let layers = vec![
            RenderLayer::new(LayerId::Opaque, SortPolicy::FrontToBack),
            RenderLayer::new(LayerId::AlphaTest, SortPolicy::FrontToBack),
            RenderLayer::new(LayerId::Vegetation, SortPolicy::Material),
            RenderLayer::new(LayerId::Water, SortPolicy::Material),
            RenderLayer::new(LayerId::Translucent, SortPolicy::BackToFront),
            RenderLayer::new(LayerId::ShadowVolume, SortPolicy::Material),
            RenderLayer::new(LayerId::Debug, SortPolicy::None),
        ];
        Self { layers }
    }

    /// Layers in draw order.
    pub fn ordered(&self) -> &[RenderLayer] {
        &self.layers
    }

    /// Look up one layer.
    pub fn layer(&self, id: LayerId) -> &RenderLayer {
        self.layers.iter().find(|l| l.id() == id).expect("all layers are registered")
    }

    /// Change a layer's sort policy.
    pub fn set_sort_policy(&mut self, id: LayerId, policy: SortPolicy) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id() == id) {
            layer.sort_policy = policy;
        }
    }

    /// Enable or disable a layer globally.
    pub fn set_enabled(&mut self, id: LayerId, enabled: bool) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id() == id) {
            layer.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_masks_are_distinct() {
        let mut seen = LayerMask::empty();
        for id in LayerId::ALL {
            let mask = id.mask();
            assert!(!seen.intersects(mask), "mask overlap for {:?}", id);
            seen |= mask;
        }
    }

    #[test]
    fn test_default_layer_policies() {
        let manager = RenderLayerManager::with_default_layers();
        assert_eq!(manager.layer(LayerId::Opaque).sort_policy(), SortPolicy::FrontToBack);
        assert_eq!(manager.layer(LayerId::Translucent).sort_policy(), SortPolicy::BackToFront);
        assert_eq!(manager.layer(LayerId::Debug).sort_policy(), SortPolicy::None);
    }

    #[test]
    fn test_draw_order_opaque_before_translucent() {
        let manager = RenderLayerManager::with_default_layers();
        let order: Vec<LayerId> = manager.ordered().iter().map(|l| l.id()).collect();
        let opaque_pos = order.iter().position(|&id| id == LayerId::Opaque).unwrap();
        let translucent_pos = order.iter().position(|&id| id == LayerId::Translucent).unwrap();
        assert!(opaque_pos < translucent_pos);
    }

    #[test]
    fn test_set_policy_and_enabled() {
        let mut manager = RenderLayerManager::with_default_layers();
        manager.set_sort_policy(LayerId::Vegetation, SortPolicy::None);
        manager.set_enabled(LayerId::Debug, false);

        assert_eq!(manager.layer(LayerId::Vegetation).sort_policy(), SortPolicy::None);
        assert!(!manager.layer(LayerId::Debug).enabled());
    }
}
