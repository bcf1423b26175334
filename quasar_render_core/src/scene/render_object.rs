/// Render objects — the unit the spatial index stores and culls.
///
/// A RenderObject owns its render batches and a cached world bounding box.
/// The world transform is owned by the surrounding scene entity; it is pushed
/// in via `set_world_transform` and the hierarchy is told with
/// `object_updated`.

use glam::Mat4;
use bitflags::bitflags;
use slotmap::new_key_type;
use super::aabb::AABB;
use super::render_batch::RenderBatch;

new_key_type! {
    /// Stable, generation-counted key for a RenderObject within a
    /// RenderHierarchy.
    ///
    /// Keys remain valid even after other objects are removed. A key becomes
    /// invalid only when its own object is removed.
    pub struct RenderObjectKey;
}

bitflags! {
    /// Render object visibility/clipping flags.
    ///
    /// Pass criteria are expressed as flag combinations: an object survives
    /// clipping only if it carries every flag in the pass's criteria mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderObjectFlags: u32 {
        /// User-level visibility toggle
        const VISIBLE            = 1 << 0;
        /// Never spatially indexed; frustum-tested every frame (skyboxes,
        /// unbounded objects)
        const ALWAYS_VISIBLE     = 1 << 1;
        /// Needs a custom prepare step before drawing
        const NEEDS_PREPARE      = 1 << 2;
        /// Casts shadows (shadow pass criteria)
        const CAST_SHADOW        = 1 << 3;
        /// Survived clipping this frame (set by the hierarchy)
        const VISIBLE_THIS_FRAME = 1 << 4;
    }
}

impl RenderObjectFlags {
    /// Default clip criteria for color passes.
    pub fn clip_criteria() -> Self {
        RenderObjectFlags::VISIBLE
    }

    /// Clip criteria for shadow passes.
    pub fn shadow_criteria() -> Self {
        RenderObjectFlags::VISIBLE | RenderObjectFlags::CAST_SHADOW
    }
}

/// A renderable object: world bounds, flags and a list of batches.
pub struct RenderObject {
    /// Bounding box in local space
    local_box: AABB,
    /// World transform (externally owned, pushed in on change)
    world_transform: Mat4,
    /// Cached world-space bounding box
    world_box: AABB,
    /// Owned drawable batches
    batches: Vec<RenderBatch>,
    /// Visibility/clipping flags
    flags: RenderObjectFlags,
    /// Slot in the spatial index; None while unindexed.
    ///
    /// Invariant: when Some, the index must know this object — a dangling
    /// value is a programming error surfaced by the hierarchy.
    tree_node: Option<u32>,
}

impl RenderObject {
    /// New visible object with the given local bounds and no batches.
    pub fn new(local_box: AABB) -> Self {
        Self {
            local_box,
            world_transform: Mat4::IDENTITY,
            world_box: local_box,
            batches: Vec::new(),
            flags: RenderObjectFlags::VISIBLE,
            tree_node: None,
        }
    }

    /// Attach a batch; returns its index within this object.
    pub fn add_batch(&mut self, batch: RenderBatch) -> u16 {
        self.batches.push(batch);
        (self.batches.len() - 1) as u16
    }

    /// Number of batches
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Get a batch by index
    pub fn batch(&self, index: usize) -> Option<&RenderBatch> {
        self.batches.get(index)
    }

    /// Iterate over all batches
    pub fn batches(&self) -> impl Iterator<Item = &RenderBatch> {
        self.batches.iter()
    }

    /// Local-space bounding box
    pub fn local_bounding_box(&self) -> &AABB {
        &self.local_box
    }

    /// Replace the local-space bounding box (geometry changed).
    pub fn set_local_bounding_box(&mut self, local_box: AABB) {
        self.local_box = local_box;
    }

    /// Cached world-space bounding box
    pub fn world_bounding_box(&self) -> &AABB {
        &self.world_box
    }

    /// Current world transform
    pub fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Push a new world transform. The world box is stale until
    /// `recalculate_world_bounding_box` (the hierarchy calls it when told
    /// about the update).
    pub fn set_world_transform(&mut self, transform: Mat4) {
        self.world_transform = transform;
    }

    /// Recompute the cached world box from the local box and transform.
    ///
    /// An empty local box (unbounded object) stays empty rather than
    /// picking up infinities from the transform.
    pub fn recalculate_world_bounding_box(&mut self) {
        self.world_box = if self.local_box.is_empty() {
            self.local_box
        } else {
            self.local_box.transformed(&self.world_transform)
        };
    }

    // ===== FLAGS =====

    pub fn flags(&self) -> RenderObjectFlags {
        self.flags
    }

    pub fn add_flag(&mut self, flag: RenderObjectFlags) {
        self.flags |= flag;
    }

    pub fn remove_flag(&mut self, flag: RenderObjectFlags) {
        self.flags &= !flag;
    }

    /// Whether all flags in `criteria` are set.
    pub fn matches(&self, criteria: RenderObjectFlags) -> bool {
        self.flags.contains(criteria)
    }

    // ===== SPATIAL INDEX BOOKKEEPING =====

    /// Slot in the spatial index (None = unindexed).
    pub fn tree_node(&self) -> Option<u32> {
        self.tree_node
    }

    pub fn set_tree_node(&mut self, node: Option<u32>) {
        self.tree_node = node;
    }
}

#[cfg(test)]
#[path = "render_object_tests.rs"]
mod tests;
