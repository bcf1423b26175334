/// Render batch — one drawable unit: a geometry range plus a material
/// binding.
///
/// Batches are owned by their RenderObject; the batch arrays reference them
/// through [`BatchHandle`]s, so a batch is never aliased mutably during a
/// frame.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::gpu::{DrawPacket, GpuBuffer, IndexType, PrimitiveTopology};
use crate::material::Material;
use super::render_object::RenderObjectKey;

/// Highest batch sort key (4 reserved bits).
pub const BATCH_SORT_KEY_MAX: u8 = 15;

/// Highest sorting offset (5 reserved bits, distance bias).
pub const SORTING_OFFSET_MAX: u8 = 31;

/// Reference to one batch of one render object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchHandle {
    pub object: RenderObjectKey,
    pub batch: u16,
}

/// Geometry ranges over shared GPU buffers.
#[derive(Clone)]
pub struct BatchGeometry {
    /// Shared vertex buffer
    pub vertex_buffer: Arc<dyn GpuBuffer>,
    /// Byte offset of the first vertex
    pub vertex_byte_offset: u64,
    /// Size of one vertex in bytes
    pub vertex_stride: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Shared index buffer (None for non-indexed geometry)
    pub index_buffer: Option<Arc<dyn GpuBuffer>>,
    /// Byte offset of the first index
    pub index_byte_offset: u64,
    /// Number of indices (0 for non-indexed geometry)
    pub index_count: u32,
    /// Index element type
    pub index_type: IndexType,
    /// Primitive topology
    pub topology: PrimitiveTopology,
}

/// One drawable unit: geometry + material.
pub struct RenderBatch {
    material: Arc<dyn Material>,
    geometry: BatchGeometry,
    /// Layer-relative sort key, 0..=15
    sort_key: u8,
    /// Distance bias for translucency ordering, 0..=31
    sorting_offset: u8,
}

impl RenderBatch {
    /// Create a batch, validating the reserved bit-widths and that the
    /// geometry ranges fit inside the bound buffers.
    pub fn new(
        material: Arc<dyn Material>,
        geometry: BatchGeometry,
        sort_key: u8,
        sorting_offset: u8,
    ) -> Result<Self> {
        if sort_key > BATCH_SORT_KEY_MAX {
            return Err(Error::invariant(
                "quasar3d::RenderBatch",
                format!("sort key {} exceeds 4 reserved bits", sort_key),
            ));
        }
        if sorting_offset > SORTING_OFFSET_MAX {
            return Err(Error::invariant(
                "quasar3d::RenderBatch",
                format!("sorting offset {} exceeds 5 reserved bits", sorting_offset),
            ));
        }

        let vertex_end = geometry.vertex_byte_offset
            + geometry.vertex_stride as u64 * geometry.vertex_count as u64;
        if vertex_end > geometry.vertex_buffer.size() {
            return Err(Error::invariant(
                "quasar3d::RenderBatch",
                format!(
                    "vertex range end {} exceeds buffer size {}",
                    vertex_end,
                    geometry.vertex_buffer.size()
                ),
            ));
        }

        if let Some(ib) = &geometry.index_buffer {
            let index_end = geometry.index_byte_offset
                + geometry.index_type.size_bytes() as u64 * geometry.index_count as u64;
            if index_end > ib.size() {
                return Err(Error::invariant(
                    "quasar3d::RenderBatch",
                    format!("index range end {} exceeds buffer size {}", index_end, ib.size()),
                ));
            }
        }

        Ok(Self { material, geometry, sort_key, sorting_offset })
    }

    /// Shared material.
    pub fn material(&self) -> &Arc<dyn Material> {
        &self.material
    }

    /// Geometry ranges.
    pub fn geometry(&self) -> &BatchGeometry {
        &self.geometry
    }

    /// Layer-relative sort key (0..=15).
    pub fn sort_key(&self) -> u8 {
        self.sort_key
    }

    /// Distance bias (0..=31).
    pub fn sorting_offset(&self) -> u8 {
        self.sorting_offset
    }

    /// Assemble a draw packet from this batch's geometry.
    ///
    /// Material parameters are bound by the pass after `pre_build`.
    pub fn to_packet(&self) -> DrawPacket {
        DrawPacket {
            vertex_buffer: Arc::clone(&self.geometry.vertex_buffer),
            vertex_byte_offset: self.geometry.vertex_byte_offset,
            vertex_count: self.geometry.vertex_count,
            index_buffer: self.geometry.index_buffer.as_ref().map(Arc::clone),
            index_byte_offset: self.geometry.index_byte_offset,
            index_count: self.geometry.index_count,
            index_type: self.geometry.index_type,
            topology: self.geometry.topology,
            params: Vec::new(),
        }
    }
}
