/// Allocates and recycles unique `u32` indices, optionally capacity-bounded.
///
/// Used for virtual-texture pool pages and shadow-atlas tiles: both need
/// stable, reusable integer identifiers into a fixed backing array. Freed
/// indices are recycled on subsequent allocations.
///
/// With a capacity bound, `alloc()` returns `None` once every slot is live —
/// exhaustion is a normal condition for the callers (they evict or defer),
/// never a panic.
pub struct SlotAllocator {
    free_list: Vec<u32>,
    next_id: u32,
    len: u32,
    capacity: Option<u32>,
}

impl SlotAllocator {
    /// Create an unbounded allocator.
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            next_id: 0,
            len: 0,
            capacity: None,
        }
    }

    /// Create an allocator that will never hand out more than
    /// `capacity` live slots at once.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            free_list: Vec::new(),
            next_id: 0,
            len: 0,
            capacity: Some(capacity),
        }
    }

    /// Allocate the next available slot index.
    ///
    /// Returns `None` when a bounded allocator is exhausted.
    pub fn alloc(&mut self) -> Option<u32> {
        if let Some(cap) = self.capacity {
            if self.len >= cap {
                return None;
            }
        }
        self.len += 1;
        Some(self.free_list.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        }))
    }

    /// Return a slot index to the pool for reuse.
    pub fn free(&mut self, id: u32) {
        debug_assert!(id < self.next_id, "freeing an unallocated slot: {}", id);
        debug_assert!(!self.free_list.contains(&id), "double-free of slot: {}", id);
        self.len -= 1;
        self.free_list.push(id);
    }

    /// Whether this slot id is currently on the free list.
    pub fn is_free(&self, id: u32) -> bool {
        id >= self.next_id || self.free_list.contains(&id)
    }

    /// Release every slot at once.
    pub fn reset(&mut self) {
        self.free_list.clear();
        self.next_id = 0;
        self.len = 0;
    }

    /// Highest index ever allocated + 1.
    ///
    /// This is the minimum capacity the backing storage must have
    /// to accommodate all allocated indices.
    pub fn high_water_mark(&self) -> u32 {
        self.next_id
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining slots in a bounded allocator (`u32::MAX` when unbounded).
    pub fn available(&self) -> u32 {
        match self.capacity {
            Some(cap) => cap - self.len,
            None => u32::MAX,
        }
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
