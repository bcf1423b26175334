/// Utility types shared across the render core.

mod slot_allocator;

pub use slot_allocator::SlotAllocator;
