/// Transient GPU buffer allocation.

mod dynamic_buffer_allocator;

pub use dynamic_buffer_allocator::{
    DynamicAllocation, DynamicBufferAllocator, DynamicBufferConfig, DEFAULT_PAGE_SIZE,
    MAX_QUAD_COUNT,
};
