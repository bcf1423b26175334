/// Per-layer sortable batch containers.
///
/// A RenderBatchArray holds the batches bucketed into one layer for one pass
/// invocation and produces a draw order for the layer's policy. Sorting is
/// lazy: a dirty flag gates re-sorting, and the distance policies re-arm the
/// flag after every sort because camera-relative order changes every frame.
///
/// Sort keys are built by typed constructors (not ad-hoc bit tricks) with a
/// documented precedence: the 4-bit batch key dominates, then the
/// policy-specific secondary (material key or quantized distance), then the
/// insertion slot as a tiebreaker so equal keys stay deterministic. All keys
/// are laid out so ascending order IS the draw order, which lets the
/// front-to-back hot path go through a radix sort.

use bitflags::bitflags;
use glam::Vec3;
use rdst::{RadixKey, RadixSort};
use crate::material::MATERIAL_SORT_KEY_MAX;
use super::render_batch::{BatchHandle, BATCH_SORT_KEY_MAX, SORTING_OFFSET_MAX};

/// Draw-order policy for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    /// Insertion order (debug draw)
    None,
    /// By material key, descending — stable across frames for identical
    /// material sets, which keeps pipeline-state changes low.
    Material,
    /// By camera distance, far first — required for translucency blending.
    BackToFront,
    /// By camera distance, near first — early-z efficiency on opaque layers.
    FrontToBack,
}

impl SortPolicy {
    /// Distance policies depend on the camera and must re-sort every frame;
    /// the material policy only re-sorts when batches changed.
    pub fn always_resorts(self) -> bool {
        matches!(self, SortPolicy::BackToFront | SortPolicy::FrontToBack)
    }
}

bitflags! {
    /// Lazy-sort state
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SortFlags: u8 {
        /// Sorting is enabled for this array
        const SORT_ENABLED  = 1 << 0;
        /// Contents changed (or policy always re-sorts) since the last sort
        const SORT_REQUIRED = 1 << 1;
    }
}

/// Distance quantization scales (fixed point)
const BACK_TO_FRONT_SCALE: f32 = 100.0;
const FRONT_TO_BACK_SCALE: f32 = 1000.0;

/// Width of the secondary key field
const SECONDARY_MASK: u32 = 0x0FFF_FFFF;

/// One batch bucketed into a layer, with everything sorting needs.
#[derive(Debug, Clone, Copy)]
pub struct BatchEntry {
    /// Back-reference to the batch
    pub handle: BatchHandle,
    /// Material sorting key (truncated to 28 bits)
    pub material_key: u32,
    /// Batch sort key (0..=15)
    pub batch_key: u8,
    /// Distance bias (0..=31)
    pub sorting_offset: u8,
    /// World-space center of the owning object's bounding box
    pub world_center: Vec3,
    /// Insertion slot, doubles as the key tiebreaker
    slot: u32,
    /// Packed draw-order key, rebuilt by `sort()`
    key: u64,
}

impl RadixKey for BatchEntry {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

/// Build a packed key: batch key (descending), secondary, slot.
///
/// Precedence is locked in by tests: batch key dominates, the secondary
/// field is next, the slot only breaks ties.
#[inline]
fn pack_key(batch_key: u8, secondary: u32, slot: u32) -> u64 {
    debug_assert!(batch_key <= BATCH_SORT_KEY_MAX);
    // Higher batch keys draw first
    let primary = (BATCH_SORT_KEY_MAX - batch_key) as u64;
    (primary << 60) | ((secondary & SECONDARY_MASK) as u64) << 32 | slot as u64
}

/// Quantized distance of a point along the camera forward axis.
///
/// Clamped to zero for points behind the camera so the packed key never
/// wraps.
#[inline]
fn quantize_distance(center: Vec3, camera_pos: Vec3, camera_dir: Vec3, scale: f32) -> u32 {
    let distance = (center - camera_pos).dot(camera_dir).max(0.0);
    ((distance * scale) as u32).min(SECONDARY_MASK)
}

/// Ordered sequence of batch references for one layer.
pub struct RenderBatchArray {
    entries: Vec<BatchEntry>,
    flags: SortFlags,
}

impl RenderBatchArray {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            flags: SortFlags::SORT_ENABLED,
        }
    }

    /// Add a batch to this layer bucket. Marks the array dirty.
    pub fn add(
        &mut self,
        handle: BatchHandle,
        material_key: u32,
        batch_key: u8,
        sorting_offset: u8,
        world_center: Vec3,
    ) {
        let slot = self.entries.len() as u32;
        self.entries.push(BatchEntry {
            handle,
            material_key: material_key.min(MATERIAL_SORT_KEY_MAX),
            batch_key: batch_key.min(BATCH_SORT_KEY_MAX),
            sorting_offset: sorting_offset.min(SORTING_OFFSET_MAX),
            world_center,
            slot,
            key: slot as u64,
        });
        self.flags |= SortFlags::SORT_REQUIRED;
    }

    /// Drop all entries, keeping capacity. Rebuilt every pass invocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.flags |= SortFlags::SORT_REQUIRED;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in current (post-sort) order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Current sort flags (tests & diagnostics).
    pub fn flags(&self) -> SortFlags {
        self.flags
    }

    /// Disable/enable sorting entirely (used by the `None` policy).
    pub fn set_sort_enabled(&mut self, enabled: bool) {
        self.flags.set(SortFlags::SORT_ENABLED, enabled);
    }

    /// Sort for the given policy. No-op unless both SORT_ENABLED and
    /// SORT_REQUIRED are set.
    pub fn sort(&mut self, policy: SortPolicy, camera_pos: Vec3, camera_dir: Vec3) {
        if !self.flags.contains(SortFlags::SORT_ENABLED | SortFlags::SORT_REQUIRED) {
            return;
        }
        if policy == SortPolicy::None {
            // Insertion order is the draw order
            self.flags.remove(SortFlags::SORT_REQUIRED);
            return;
        }

        for entry in &mut self.entries {
            entry.key = match policy {
                SortPolicy::Material => {
                    // Material key descending
                    pack_key(entry.batch_key, SECONDARY_MASK - entry.material_key, entry.slot)
                }
                SortPolicy::BackToFront => {
                    // Far first; the sorting offset biases a batch deeper
                    let quantized = quantize_distance(
                        entry.world_center,
                        camera_pos,
                        camera_dir,
                        BACK_TO_FRONT_SCALE,
                    )
                    .saturating_add((SORTING_OFFSET_MAX - entry.sorting_offset) as u32)
                    .min(SECONDARY_MASK);
                    pack_key(entry.batch_key, SECONDARY_MASK - quantized, entry.slot)
                }
                SortPolicy::FrontToBack => {
                    // Near first
                    let quantized = quantize_distance(
                        entry.world_center,
                        camera_pos,
                        camera_dir,
                        FRONT_TO_BACK_SCALE,
                    );
                    pack_key(entry.batch_key, quantized, entry.slot)
                }
                SortPolicy::None => unreachable!(),
            };
        }

        match policy {
            SortPolicy::FrontToBack => {
                // Opaque layers carry the bulk of the scene; radix sort keeps
                // the per-frame re-sort linear. Keys are unique (slot
                // tiebreaker), so unstable sorting cannot reorder ties.
                self.entries.radix_sort_unstable();
            }
            _ => {
                self.entries.sort_by_key(|e| e.key);
            }
        }

        if policy.always_resorts() {
            self.flags |= SortFlags::SORT_REQUIRED;
        } else {
            self.flags.remove(SortFlags::SORT_REQUIRED);
        }
    }
}

impl Default for RenderBatchArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "batch_array_tests.rs"]
mod tests;
