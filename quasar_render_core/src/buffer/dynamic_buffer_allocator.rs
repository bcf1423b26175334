/// Dynamic buffer allocator — per-frame ring allocation of transient
/// vertex/index data (UI quads, decal blit geometry, landscape page meshes,
/// particle instancing).
///
/// Hands out small contiguous regions of large page-sized GPU buffers,
/// amortizing buffer creation. A page retired at the end of a frame may not
/// be reused until the GPU fence created that frame has signaled — checked
/// non-blocking in `begin_frame`, never waited on.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::gpu::{BufferDesc, BufferUsage, GpuBuffer, GraphicsDevice, SyncObject};

/// Default page size: 128 KiB.
pub const DEFAULT_PAGE_SIZE: u32 = 128 * 1024;

/// Largest quad count the 16-bit quad-list index cache can address.
pub const MAX_QUAD_COUNT: u32 = 16384;

/// Allocator configuration.
#[derive(Debug, Clone)]
pub struct DynamicBufferConfig {
    /// Size of one transient buffer page in bytes
    pub page_size: u32,
}

impl Default for DynamicBufferConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

/// One region handed out by the allocator.
///
/// The region stays valid for the current frame; the fence machinery
/// guarantees the GPU is done with it before the page is recycled.
#[derive(Clone)]
pub struct DynamicAllocation {
    /// Backing page buffer
    pub buffer: Arc<dyn GpuBuffer>,
    /// Byte offset of the region within the page
    pub byte_offset: u32,
    /// First element index (byte_offset / element size)
    pub base_index: u32,
    /// Number of allocated elements
    pub count: u32,
    element_size: u32,
}

impl DynamicAllocation {
    /// Region size in bytes.
    pub fn size_bytes(&self) -> u32 {
        self.count * self.element_size
    }

    /// Write the region's contents. The slice must cover the region exactly.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        if data.len() != self.size_bytes() as usize {
            return Err(Error::invariant(
                "quasar3d::DynamicBufferAllocator",
                format!("write of {} bytes into a {}-byte region", data.len(), self.size_bytes()),
            ));
        }
        self.buffer.write(self.byte_offset as u64, data)
    }

    /// Write typed elements (vertices, indices) into the region.
    pub fn write_slice<T: bytemuck::NoUninit>(&self, data: &[T]) -> Result<()> {
        self.write(bytemuck::cast_slice(data))
    }
}

/// One transient page and its write cursor.
struct BufferPage {
    buffer: Arc<dyn GpuBuffer>,
    cursor: u32,
}

/// Page lists for one buffer kind (vertex or index).
struct PagePool {
    usage: BufferUsage,
    current: Option<BufferPage>,
    free: Vec<BufferPage>,
    /// Retired this frame, waiting for the end-of-frame fence stamp
    retired: Vec<BufferPage>,
    /// Retired in earlier frames, waiting for their fence
    used: Vec<(BufferPage, Arc<dyn SyncObject>)>,
}

impl PagePool {
    fn new(usage: BufferUsage) -> Self {
        Self {
            usage,
            current: None,
            free: Vec::new(),
            retired: Vec::new(),
            used: Vec::new(),
        }
    }

    /// Recycle fenced pages whose GPU work has completed.
    fn recycle(&mut self) {
        let mut still_used = Vec::new();
        for (mut page, sync) in self.used.drain(..) {
            if sync.signaled() {
                page.cursor = 0;
                self.free.push(page);
            } else {
                still_used.push((page, sync));
            }
        }
        self.used = still_used;
    }

    /// Retire the current page and stamp everything retired this frame.
    fn end_frame(&mut self, sync: &Arc<dyn SyncObject>) {
        if let Some(page) = self.current.take() {
            self.retired.push(page);
        }
        for page in self.retired.drain(..) {
            self.used.push((page, Arc::clone(sync)));
        }
    }

    /// Carve `size` bytes aligned to `align` out of the current page,
    /// starting a fresh page on overflow.
    fn allocate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        page_size: u32,
        size: u32,
        align: u32,
    ) -> Result<(Arc<dyn GpuBuffer>, u32)> {
        let fits = |page: &BufferPage| {
            let aligned = page.cursor.div_ceil(align) * align;
            aligned + size <= page_size
        };

        if self.current.as_ref().map(|p| !fits(p)).unwrap_or(true) {
            // Retire the overflowing page; it still carries this frame's
            // writes and gets fenced at end_frame
            if let Some(page) = self.current.take() {
                self.retired.push(page);
            }
            let page = match self.free.pop() {
                Some(page) => page,
                None => BufferPage {
                    buffer: device.create_buffer(&BufferDesc {
                        size: page_size as u64,
                        usage: self.usage,
                        cpu_writable: true,
                    })?,
                    cursor: 0,
                },
            };
            self.current = Some(page);
        }

        let page = self.current.as_mut().expect("current page exists");
        let offset = page.cursor.div_ceil(align) * align;
        page.cursor = offset + size;
        Ok((Arc::clone(&page.buffer), offset))
    }
}

/// Cached quad-list index buffer: the fixed `{0,3,1,1,3,2}`-per-quad
/// pattern, regenerated (with doubled capacity) only when a larger quad
/// count is requested.
struct QuadIndexCache {
    buffer: Option<Arc<dyn GpuBuffer>>,
    capacity_quads: u32,
}

/// Per-frame ring-buffer allocator for transient GPU buffers.
pub struct DynamicBufferAllocator {
    device: Arc<dyn GraphicsDevice>,
    page_size: u32,
    vertex_pool: PagePool,
    index_pool: PagePool,
    quad_cache: QuadIndexCache,
}

impl DynamicBufferAllocator {
    pub fn new(device: Arc<dyn GraphicsDevice>, config: DynamicBufferConfig) -> Self {
        Self {
            device,
            page_size: config.page_size,
            vertex_pool: PagePool::new(BufferUsage::Vertex),
            index_pool: PagePool::new(BufferUsage::Index),
            quad_cache: QuadIndexCache { buffer: None, capacity_quads: 0 },
        }
    }

    /// Configured page size in bytes.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Allocate `vertex_count` vertices of `vertex_size` bytes each.
    ///
    /// Requests larger than one page are a capacity error — render passes
    /// are expected to batch within page limits.
    pub fn allocate_vertex_buffer(
        &mut self,
        vertex_size: u32,
        vertex_count: u32,
    ) -> Result<DynamicAllocation> {
        let size = vertex_size * vertex_count;
        if size == 0 || size > self.page_size {
            return Err(Error::CapacityExceeded {
                requested: size as u64,
                capacity: self.page_size as u64,
            });
        }

        let (buffer, offset) =
            self.vertex_pool.allocate(&self.device, self.page_size, size, vertex_size)?;
        Ok(DynamicAllocation {
            buffer,
            byte_offset: offset,
            base_index: offset / vertex_size,
            count: vertex_count,
            element_size: vertex_size,
        })
    }

    /// Allocate `index_count` 16-bit indices.
    pub fn allocate_index_buffer(&mut self, index_count: u32) -> Result<DynamicAllocation> {
        let size = index_count * 2;
        if size == 0 || size > self.page_size {
            return Err(Error::CapacityExceeded {
                requested: size as u64,
                capacity: self.page_size as u64,
            });
        }

        let (buffer, offset) =
            self.index_pool.allocate(&self.device, self.page_size, size, 2)?;
        Ok(DynamicAllocation {
            buffer,
            byte_offset: offset,
            base_index: offset / 2,
            count: index_count,
            element_size: 2,
        })
    }

    /// Shared quad-list index buffer covering at least `quad_count` quads.
    ///
    /// Pattern per quad q (vertices q*4 .. q*4+3): `{0, 3, 1, 1, 3, 2}`.
    pub fn allocate_quad_list_index_buffer(
        &mut self,
        quad_count: u32,
    ) -> Result<Arc<dyn GpuBuffer>> {
        if quad_count > MAX_QUAD_COUNT {
            return Err(Error::CapacityExceeded {
                requested: quad_count as u64,
                capacity: MAX_QUAD_COUNT as u64,
            });
        }

        if quad_count <= self.quad_cache.capacity_quads {
            if let Some(buffer) = &self.quad_cache.buffer {
                return Ok(Arc::clone(buffer));
            }
        }

        // Regenerate with at least doubled capacity
        let capacity = quad_count
            .max(self.quad_cache.capacity_quads * 2)
            .max(128)
            .min(MAX_QUAD_COUNT);

        let mut indices: Vec<u8> = Vec::with_capacity(capacity as usize * 6 * 2);
        for quad in 0..capacity {
            let base = (quad * 4) as u16;
            for offset in [0u16, 3, 1, 1, 3, 2] {
                indices.extend_from_slice(&(base + offset).to_le_bytes());
            }
        }

        let buffer = self.device.create_buffer(&BufferDesc {
            size: indices.len() as u64,
            usage: BufferUsage::Index,
            cpu_writable: true,
        })?;
        buffer.write(0, &indices)?;

        self.quad_cache.buffer = Some(Arc::clone(&buffer));
        self.quad_cache.capacity_quads = capacity;
        Ok(buffer)
    }

    /// Start-of-frame: recycle pages whose fence has signaled. Non-blocking.
    pub fn begin_frame(&mut self) {
        self.vertex_pool.recycle();
        self.index_pool.recycle();
    }

    /// End-of-frame: retire active pages and stamp everything retired this
    /// frame with a fresh fence.
    pub fn end_frame(&mut self) {
        let sync = self.device.create_sync_object();
        self.vertex_pool.end_frame(&sync);
        self.index_pool.end_frame(&sync);
    }
}

#[cfg(test)]
#[path = "dynamic_buffer_allocator_tests.rs"]
mod tests;
