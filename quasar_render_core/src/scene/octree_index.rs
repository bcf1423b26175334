/// OctreeIndex — static octree spatial index for frustum culling.
///
/// Single-node placement: each object is stored in exactly one node — the
/// deepest node whose AABB fully contains the object. If the object straddles
/// a child boundary, it stays in the parent. No duplication, so query results
/// never need dedup.
///
/// The tree is pre-allocated at construction time with a fixed `max_depth`;
/// all 8^d nodes exist regardless of occupancy. A degenerate (zero-size)
/// world box still builds a valid single-cell tree.
///
/// Traversal threads a [`CullContext`] through the recursion: planes fully
/// satisfied by a node are skipped for its descendants, and the plane that
/// rejected the previous sibling is tested first on the next one.

use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::camera::{CullContext, Frustum, FrustumTest};
use super::aabb::AABB;
use super::render_object::RenderObjectKey;

/// Index of the root node in the flat node array.
const ROOT: u32 = 0;

/// A single node in the octree.
struct OctreeNode {
    /// World-space AABB of this node
    aabb: AABB,
    /// Index of the first child in the flat array (0 = no children / leaf)
    first_child: u32,
    /// Objects stored in this node
    objects: Vec<RenderObjectKey>,
}

/// Static octree spatial index.
///
/// Objects are inserted into the deepest node that fully contains their
/// world AABB. Insert/update report the node index so the owning hierarchy
/// can keep each object's `tree_node` field in sync.
pub struct OctreeIndex {
    /// Flat array of all octree nodes (pre-allocated)
    nodes: Vec<OctreeNode>,
    /// Maximum depth of the tree (root = depth 0)
    max_depth: u32,
    /// Reverse lookup: object key → (node index, world AABB).
    /// Needed for O(1) remove without tree traversal.
    object_locations: FxHashMap<RenderObjectKey, (u32, AABB)>,
    /// Pre-computed subtree sizes indexed by remaining depth.
    /// subtree_sizes[d] = total node count for a subtree of depth d.
    subtree_sizes: Vec<u32>,
}

impl OctreeIndex {
    /// Create a new static octree with the given world bounds and depth.
    ///
    /// Total nodes = (8^(d+1) - 1) / 7. Typical depths: 4–6.
    pub fn new(world_aabb: AABB, max_depth: u32) -> Self {
        let world_aabb = if world_aabb.is_empty() {
            // Degenerate but valid zero-size root
            AABB::new(Vec3::ZERO, Vec3::ZERO)
        } else {
            world_aabb
        };

        let total_nodes = Self::total_node_count(max_depth);
        let mut nodes = Vec::with_capacity(total_nodes as usize);
        Self::build_recursive(&mut nodes, &world_aabb, 0, max_depth);
        debug_assert_eq!(nodes.len(), total_nodes as usize);

        let subtree_sizes: Vec<u32> = (0..=max_depth).map(Self::total_node_count).collect();

        Self {
            nodes,
            max_depth,
            object_locations: FxHashMap::default(),
            subtree_sizes,
        }
    }

    /// Total number of nodes for a given depth: (8^(d+1) - 1) / 7
    fn total_node_count(max_depth: u32) -> u32 {
        let mut count = 0u32;
        let mut level_count = 1u32;
        for _ in 0..=max_depth {
            count += level_count;
            level_count *= 8;
        }
        count
    }

    /// Recursively build the static octree node array (depth-first).
    fn build_recursive(nodes: &mut Vec<OctreeNode>, aabb: &AABB, depth: u32, max_depth: u32) {
        let node_index = nodes.len();

        if depth >= max_depth {
            nodes.push(OctreeNode { aabb: *aabb, first_child: 0, objects: Vec::new() });
            return;
        }

        nodes.push(OctreeNode { aabb: *aabb, first_child: 0, objects: Vec::new() });

        let center = aabb.center();
        let first_child = nodes.len() as u32;
        nodes[node_index].first_child = first_child;

        for octant in 0..8u8 {
            let child_aabb = Self::octant_aabb(aabb, &center, octant);
            Self::build_recursive(nodes, &child_aabb, depth + 1, max_depth);
        }
    }

    /// Compute the AABB of a specific octant (0–7).
    ///
    /// Octant bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low, 1 = high).
    fn octant_aabb(parent: &AABB, center: &Vec3, octant: u8) -> AABB {
        AABB {
            min: Vec3::new(
                if octant & 1 == 0 { parent.min.x } else { center.x },
                if octant & 2 == 0 { parent.min.y } else { center.y },
                if octant & 4 == 0 { parent.min.z } else { center.z },
            ),
            max: Vec3::new(
                if octant & 1 == 0 { center.x } else { parent.max.x },
                if octant & 2 == 0 { center.y } else { parent.max.y },
                if octant & 4 == 0 { center.z } else { parent.max.z },
            ),
        }
    }

    /// Determine which octant a point falls into relative to a center.
    fn point_octant(center: &Vec3, point: &Vec3) -> u8 {
        ((point.x >= center.x) as u8)
            | (((point.y >= center.y) as u8) << 1)
            | (((point.z >= center.z) as u8) << 2)
    }

    /// Offset of octant `i` in the depth-first node layout.
    fn subtree_offset(&self, octant: u8, remaining_depth: u32) -> u32 {
        octant as u32 * self.subtree_sizes[remaining_depth as usize]
    }

    /// Find the deepest node that fully contains an AABB.
    ///
    /// Descends only while both box corners fall into the same octant.
    fn find_target_node(&self, world_aabb: &AABB) -> u32 {
        if !self.nodes[ROOT as usize].aabb.contains(world_aabb) {
            return ROOT;
        }

        let mut node_idx = ROOT;
        let mut depth = 0;

        loop {
            if depth >= self.max_depth {
                return node_idx;
            }

            let first_child = self.nodes[node_idx as usize].first_child;
            if first_child == 0 {
                return node_idx;
            }

            let center = self.nodes[node_idx as usize].aabb.center();
            let min_oct = Self::point_octant(&center, &world_aabb.min);
            let max_oct = Self::point_octant(&center, &world_aabb.max);

            if min_oct != max_oct {
                // Straddles a boundary — stays here
                return node_idx;
            }

            node_idx = first_child + self.subtree_offset(min_oct, self.max_depth - depth - 1);
            depth += 1;
        }
    }

    /// Insert an object; returns the node index it landed in.
    pub fn insert(&mut self, key: RenderObjectKey, world_aabb: &AABB) -> u32 {
        let node_idx = self.find_target_node(world_aabb);
        self.nodes[node_idx as usize].objects.push(key);
        self.object_locations.insert(key, (node_idx, *world_aabb));
        node_idx
    }

    /// Remove an object. Returns false if the index never knew it.
    pub fn remove(&mut self, key: RenderObjectKey) -> bool {
        if let Some((node_idx, _)) = self.object_locations.remove(&key) {
            let objects = &mut self.nodes[node_idx as usize].objects;
            if let Some(pos) = objects.iter().position(|&k| k == key) {
                objects.swap_remove(pos);
            }
            true
        } else {
            false
        }
    }

    /// Re-position an object after its world AABB changed; returns the node
    /// index it now occupies. Stays in place (AABB refresh only) when the
    /// target node is unchanged.
    pub fn update(&mut self, key: RenderObjectKey, world_aabb: &AABB) -> u32 {
        let target = self.find_target_node(world_aabb);

        if let Some(entry) = self.object_locations.get_mut(&key) {
            if entry.0 == target {
                entry.1 = *world_aabb;
                return target;
            }
        }

        self.remove(key);
        self.nodes[target as usize].objects.push(key);
        self.object_locations.insert(key, (target, *world_aabb));
        target
    }

    /// Whether the index currently stores this object.
    pub fn contains(&self, key: RenderObjectKey) -> bool {
        self.object_locations.contains_key(&key)
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.object_locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_locations.is_empty()
    }

    /// Collect every object visible from the frustum.
    pub fn clip(&self, frustum: &Frustum, results: &mut Vec<RenderObjectKey>) {
        if self.nodes.is_empty() {
            return;
        }

        let mut ctx = CullContext::new();
        let class = frustum.classify_with(&self.nodes[ROOT as usize].aabb, &mut ctx);
        self.clip_recursive(ROOT, frustum, class, ctx, results, 0);
    }

    /// Recursive clip with plane-coherence state.
    ///
    /// `ctx` carries the planes still active for this subtree; the
    /// start-plane is threaded across siblings so a rejecting plane is tried
    /// first on the next child.
    fn clip_recursive(
        &self,
        node_idx: u32,
        frustum: &Frustum,
        classification: FrustumTest,
        ctx: CullContext,
        results: &mut Vec<RenderObjectKey>,
        depth: u32,
    ) {
        let node = &self.nodes[node_idx as usize];

        match classification {
            FrustumTest::Outside => {}

            FrustumTest::Inside => {
                // Everything in this subtree is visible
                self.collect_all(node_idx, results, depth);
            }

            FrustumTest::Intersect => {
                // Test objects at this node individually, with the reduced
                // plane set
                for &key in &node.objects {
                    if let Some((_, world_aabb)) = self.object_locations.get(&key) {
                        let mut obj_ctx = ctx;
                        if frustum.classify_with(world_aabb, &mut obj_ctx)
                            != FrustumTest::Outside
                        {
                            results.push(key);
                        }
                    }
                }

                // Recurse into children
                if depth < self.max_depth && node.first_child != 0 {
                    let mut start_plane = ctx.start_plane;
                    for octant in 0..8u8 {
                        let child_idx = node.first_child
                            + self.subtree_offset(octant, self.max_depth - depth - 1);
                        let child_aabb = &self.nodes[child_idx as usize].aabb;

                        let mut child_ctx =
                            CullContext { plane_mask: ctx.plane_mask, start_plane };
                        let child_class = frustum.classify_with(child_aabb, &mut child_ctx);
                        // Plane coherence: the next sibling tries the plane
                        // that just rejected (or last intersected) first
                        start_plane = child_ctx.start_plane;

                        self.clip_recursive(
                            child_idx, frustum, child_class, child_ctx, results, depth + 1,
                        );
                    }
                }
            }
        }
    }

    /// Collect all objects from a node and its entire subtree (no frustum
    /// test). Used when a node's AABB is fully inside the frustum.
    fn collect_all(&self, node_idx: u32, results: &mut Vec<RenderObjectKey>, depth: u32) {
        let node = &self.nodes[node_idx as usize];
        results.extend_from_slice(&node.objects);

        if depth < self.max_depth && node.first_child != 0 {
            for octant in 0..8u8 {
                let child_idx =
                    node.first_child + self.subtree_offset(octant, self.max_depth - depth - 1);
                self.collect_all(child_idx, results, depth + 1);
            }
        }
    }
}
