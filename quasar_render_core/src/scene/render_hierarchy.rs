/// Render hierarchy — owns the authoritative set of render objects and
/// answers "which objects are visible from this camera" every frame.
///
/// Objects live in a generation-counted slot map, so removing one never
/// invalidates another object's key and no caller ever patches a moved
/// neighbor's cached index.
///
/// Spatially indexable objects go into a static octree built lazily on the
/// first clip; ALWAYS_VISIBLE objects (skyboxes, unbounded geometry) stay in
/// a flat list and are frustum-tested brute force each frame.

use glam::Mat4;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use crate::camera::Camera;
use crate::render_error;
use super::aabb::AABB;
use super::octree_index::OctreeIndex;
use super::render_object::{RenderObject, RenderObjectFlags, RenderObjectKey};

/// Default octree depth (8^4 leaf cells).
const DEFAULT_MAX_DEPTH: u32 = 4;

/// Owns all render objects and the spatial index over them.
pub struct RenderHierarchy {
    objects: SlotMap<RenderObjectKey, RenderObject>,
    /// Built lazily on the first clip
    octree: Option<OctreeIndex>,
    /// ALWAYS_VISIBLE objects, never spatially indexed
    unindexed: Vec<RenderObjectKey>,
    /// Indexable objects added before the octree exists
    pending_index: Vec<RenderObjectKey>,
    /// Objects whose transform changed since the last update
    dirty: FxHashSet<RenderObjectKey>,
    max_depth: u32,
}

impl RenderHierarchy {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            objects: SlotMap::with_key(),
            octree: None,
            unindexed: Vec::new(),
            pending_index: Vec::new(),
            dirty: FxHashSet::default(),
            max_depth,
        }
    }

    /// Register an object. Recomputes its world box and places it in the
    /// spatial structure (or the brute-force list for ALWAYS_VISIBLE).
    pub fn add_render_object(&mut self, mut object: RenderObject) -> RenderObjectKey {
        object.recalculate_world_bounding_box();
        let always_visible = object.flags().contains(RenderObjectFlags::ALWAYS_VISIBLE);
        let world_box = *object.world_bounding_box();

        let key = self.objects.insert(object);

        if always_visible {
            self.unindexed.push(key);
        } else if let Some(octree) = &mut self.octree {
            let node = octree.insert(key, &world_box);
            self.objects[key].set_tree_node(Some(node));
        } else {
            self.pending_index.push(key);
        }

        key
    }

    /// Unregister an object, returning it. An unknown key is a programming
    /// error — the caller removed it twice or never added it.
    pub fn remove_render_object(&mut self, key: RenderObjectKey) -> Option<RenderObject> {
        let object = match self.objects.remove(key) {
            Some(object) => object,
            None => {
                render_error!(
                    "quasar3d::RenderHierarchy",
                    "remove_render_object: unknown key {:?}",
                    key
                );
                return None;
            }
        };

        if object.tree_node().is_some() {
            let removed = self.octree.as_mut().map(|o| o.remove(key)).unwrap_or(false);
            if !removed {
                // tree_node said indexed but the octree disagrees
                render_error!(
                    "quasar3d::RenderHierarchy",
                    "remove_render_object: dangling tree node {:?} for {:?}",
                    object.tree_node(),
                    key
                );
            }
        }

        self.unindexed.retain(|&k| k != key);
        self.pending_index.retain(|&k| k != key);
        self.dirty.remove(&key);
        Some(object)
    }

    /// Mark an object for re-positioning after its transform/bounds changed.
    pub fn object_updated(&mut self, key: RenderObjectKey) {
        if self.objects.contains_key(key) {
            self.dirty.insert(key);
        }
    }

    /// Convenience: push a new world transform and mark the object updated.
    pub fn set_world_transform(&mut self, key: RenderObjectKey, transform: Mat4) -> bool {
        if let Some(object) = self.objects.get_mut(key) {
            object.set_world_transform(transform);
            self.dirty.insert(key);
            true
        } else {
            false
        }
    }

    /// Get an object by key
    pub fn object(&self, key: RenderObjectKey) -> Option<&RenderObject> {
        self.objects.get(key)
    }

    /// Get an object mutably by key
    pub fn object_mut(&mut self, key: RenderObjectKey) -> Option<&mut RenderObject> {
        self.objects.get_mut(key)
    }

    /// Number of registered objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Process pending transform updates: recompute world boxes and
    /// re-position objects within the octree (in place when possible).
    pub fn update(&mut self) {
        if self.dirty.is_empty() {
            return;
        }

        let dirty = std::mem::take(&mut self.dirty);
        for key in dirty {
            let Some(object) = self.objects.get_mut(key) else { continue };
            object.recalculate_world_bounding_box();
            let world_box = *object.world_bounding_box();

            if object.flags().contains(RenderObjectFlags::ALWAYS_VISIBLE) {
                continue;
            }
            if let (Some(octree), Some(_)) = (&mut self.octree, object.tree_node()) {
                let node = octree.update(key, &world_box);
                object.set_tree_node(Some(node));
            }
        }
    }

    /// Build the octree from every indexable object registered so far.
    fn ensure_octree(&mut self) {
        if self.octree.is_some() {
            return;
        }

        // World bounds = union of all indexable world boxes. An empty union
        // still yields a valid degenerate tree.
        let mut world_bounds = AABB::empty();
        for &key in &self.pending_index {
            if let Some(object) = self.objects.get(key) {
                world_bounds.merge(object.world_bounding_box());
            }
        }

        let mut octree = OctreeIndex::new(world_bounds, self.max_depth);
        for key in std::mem::take(&mut self.pending_index) {
            if let Some(object) = self.objects.get_mut(key) {
                let world_box = *object.world_bounding_box();
                let node = octree.insert(key, &world_box);
                object.set_tree_node(Some(node));
            }
        }
        self.octree = Some(octree);
    }

    /// The per-frame hot path: collect keys of objects visible from the
    /// camera that match the criteria flags.
    ///
    /// Survivors are flagged VISIBLE_THIS_FRAME; everything else has the
    /// flag cleared.
    pub fn clip(
        &mut self,
        camera: &Camera,
        criteria: RenderObjectFlags,
        out: &mut Vec<RenderObjectKey>,
    ) {
        self.ensure_octree();
        self.update();

        let frustum = camera.build_frustum();

        for (_, object) in self.objects.iter_mut() {
            object.remove_flag(RenderObjectFlags::VISIBLE_THIS_FRAME);
        }

        let mut visible = Vec::new();

        // Brute-force pass over unindexed objects. An empty world box means
        // unbounded (skybox) — always passes the frustum.
        for &key in &self.unindexed {
            if let Some(object) = self.objects.get(key) {
                let world_box = object.world_bounding_box();
                if world_box.is_empty() || frustum.intersects_aabb(world_box) {
                    visible.push(key);
                }
            }
        }

        // Hierarchical pass over indexed objects
        if let Some(octree) = &self.octree {
            octree.clip(&frustum, &mut visible);
        }

        for key in visible {
            let Some(object) = self.objects.get_mut(key) else { continue };
            object.add_flag(RenderObjectFlags::VISIBLE_THIS_FRAME);
            if object.matches(criteria) {
                out.push(key);
            }
        }
    }
}

impl Default for RenderHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_hierarchy_tests.rs"]
mod tests;
