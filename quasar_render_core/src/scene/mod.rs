/// Scene module — render objects, spatial indexing and batch sorting.

mod aabb;
mod batch_array;
mod octree_index;
mod render_batch;
mod render_hierarchy;
mod render_object;

pub use aabb::AABB;
pub use batch_array::{BatchEntry, RenderBatchArray, SortFlags, SortPolicy};
pub use octree_index::OctreeIndex;
pub use render_batch::{
    BatchGeometry, BatchHandle, RenderBatch, BATCH_SORT_KEY_MAX, SORTING_OFFSET_MAX,
};
pub use render_hierarchy::RenderHierarchy;
pub use render_object::{RenderObject, RenderObjectFlags, RenderObjectKey};
