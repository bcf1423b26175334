/// Virtual-texture page keys, the fixed atlas page pool, and the nested-quad
/// UV math.
///
/// A page key encodes `(level, x, y)` of one quadtree tile into a single
/// 64-bit integer for hashed lookup: level in the top 8 bits, x and y in two
/// 28-bit fields below it.

use glam::Vec2;
use crate::error::{Error, Result};
use crate::utils::SlotAllocator;

/// Bits reserved per tile coordinate.
const COORD_BITS: u32 = 28;
const COORD_MASK: u64 = (1 << COORD_BITS) - 1;

/// Key of one quadtree tile: `(level, x, y)` packed into 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(u64);

impl PageKey {
    pub fn new(level: u32, x: u32, y: u32) -> Self {
        debug_assert!(level < 256);
        debug_assert!(x as u64 <= COORD_MASK && y as u64 <= COORD_MASK);
        PageKey(((level as u64) << (2 * COORD_BITS)) | ((x as u64) << COORD_BITS) | y as u64)
    }

    pub fn level(self) -> u32 {
        (self.0 >> (2 * COORD_BITS)) as u32
    }

    pub fn x(self) -> u32 {
        ((self.0 >> COORD_BITS) & COORD_MASK) as u32
    }

    pub fn y(self) -> u32 {
        (self.0 & COORD_MASK) as u32
    }

    /// The tile one quadtree level up that contains this tile.
    pub fn parent(self) -> Option<PageKey> {
        if self.level() == 0 {
            None
        } else {
            Some(PageKey::new(self.level() - 1, self.x() >> 1, self.y() >> 1))
        }
    }

    /// Raw packed value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A UV rectangle within the virtual-texture atlas (or within a page).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub offset: Vec2,
    pub size: Vec2,
}

impl UvRect {
    /// The whole [0,1]² square.
    pub fn full() -> Self {
        Self { offset: Vec2::ZERO, size: Vec2::ONE }
    }
}

/// Map a descendant tile onto the UV rect of a resident ancestor page.
///
/// Nested-quad math: the descendant covers a `1/2^dl`-sized sub-square of
/// the ancestor's footprint, where `dl` is the level difference. The
/// returned rect addresses exactly that sub-square of `ancestor_uv`, so
/// coarse data is sampled seamlessly while the finer tile is still being
/// generated.
pub fn map_to_page(ancestor_uv: &UvRect, ancestor: PageKey, level: u32, x: u32, y: u32) -> UvRect {
    debug_assert!(level >= ancestor.level());
    let dl = level - ancestor.level();
    debug_assert!(x >> dl == ancestor.x() && y >> dl == ancestor.y());

    let scale = 1.0 / (1u32 << dl) as f32;
    let local_x = (x - (ancestor.x() << dl)) as f32;
    let local_y = (y - (ancestor.y() << dl)) as f32;

    UvRect {
        offset: ancestor_uv.offset + Vec2::new(local_x, local_y) * scale * ancestor_uv.size,
        size: ancestor_uv.size * scale,
    }
}

/// One slot in the atlas grid.
#[derive(Debug, Clone, Copy)]
pub struct AtlasPage {
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Fixed pool of atlas page slots, sized `(width/page) × (height/page)`.
pub struct VirtualTexturePool {
    atlas_width: u32,
    atlas_height: u32,
    page_size: u32,
    pages: Vec<AtlasPage>,
    slots: SlotAllocator,
}

impl VirtualTexturePool {
    pub fn new(atlas_width: u32, atlas_height: u32, page_size: u32) -> Result<Self> {
        if page_size == 0 || atlas_width % page_size != 0 || atlas_height % page_size != 0 {
            return Err(Error::InvalidResource(format!(
                "atlas {}x{} not divisible by page size {}",
                atlas_width, atlas_height, page_size
            )));
        }

        let cols = atlas_width / page_size;
        let rows = atlas_height / page_size;
        let mut pages = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                pages.push(AtlasPage { offset_x: col * page_size, offset_y: row * page_size });
            }
        }

        let count = pages.len() as u32;
        Ok(Self {
            atlas_width,
            atlas_height,
            page_size,
            pages,
            slots: SlotAllocator::with_capacity(count),
        })
    }

    /// Total number of pool slots.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Slots currently free.
    pub fn available(&self) -> u32 {
        self.slots.available()
    }

    /// Page size in texels.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Claim a free slot; None when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<u32> {
        self.slots.alloc()
    }

    /// Return a slot to the pool. Releasing a slot that is already free is
    /// an invariant violation — it would let two resident pages share one
    /// atlas rectangle.
    pub fn release(&mut self, page_id: u32) -> Result<()> {
        if page_id >= self.page_count() || self.slots.is_free(page_id) {
            return Err(Error::invariant(
                "quasar3d::VirtualTexturePool",
                format!("release of free or unknown page slot {}", page_id),
            ));
        }
        self.slots.free(page_id);
        Ok(())
    }

    /// Release every slot (full invalidation).
    pub fn release_all(&mut self) {
        self.slots.reset();
    }

    /// Atlas placement of a slot.
    pub fn page(&self, page_id: u32) -> &AtlasPage {
        &self.pages[page_id as usize]
    }

    /// Texel rectangle of a slot within the atlas.
    pub fn page_rect(&self, page_id: u32) -> (u32, u32, u32) {
        let page = self.page(page_id);
        (page.offset_x, page.offset_y, self.page_size)
    }

    /// Inner UV rect of a slot, inset by `texel_inset` texels on every side.
    ///
    /// The inset reserves border texels for the mip chain so bilinear
    /// filtering never bleeds across neighboring pages.
    pub fn page_uv(&self, page_id: u32, texel_inset: f32) -> UvRect {
        let page = self.page(page_id);
        let atlas = Vec2::new(self.atlas_width as f32, self.atlas_height as f32);
        let offset =
            Vec2::new(page.offset_x as f32 + texel_inset, page.offset_y as f32 + texel_inset);
        let size = Vec2::splat(self.page_size as f32 - 2.0 * texel_inset);
        UvRect { offset: offset / atlas, size: size / atlas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key_roundtrip() {
        let key = PageKey::new(7, 123_456, 654_321);
        assert_eq!(key.level(), 7);
        assert_eq!(key.x(), 123_456);
        assert_eq!(key.y(), 654_321);
    }

    #[test]
    fn test_page_key_parent_walk() {
        let key = PageKey::new(3, 5, 6);
        let parent = key.parent().unwrap();
        assert_eq!(parent, PageKey::new(2, 2, 3));

        let root = PageKey::new(0, 0, 0);
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn test_page_keys_unique() {
        // Same coordinates at different levels are distinct keys
        assert_ne!(PageKey::new(1, 0, 0), PageKey::new(2, 0, 0));
        assert_ne!(PageKey::new(1, 1, 0), PageKey::new(1, 0, 1));
    }

    #[test]
    fn test_pool_layout() {
        let pool = VirtualTexturePool::new(1024, 512, 256).unwrap();
        assert_eq!(pool.page_count(), 8);

        let page = pool.page(5);
        // Row-major: slot 5 = row 1, col 1
        assert_eq!((page.offset_x, page.offset_y), (256, 256));
    }

    #[test]
    fn test_pool_rejects_unaligned_page_size() {
        assert!(VirtualTexturePool::new(1000, 512, 256).is_err());
    }

    #[test]
    fn test_pool_acquire_release() {
        let mut pool = VirtualTexturePool::new(512, 512, 256).unwrap();
        assert_eq!(pool.available(), 4);

        let a = pool.acquire().unwrap();
        pool.acquire().unwrap();
        assert_eq!(pool.available(), 2);

        pool.release(a).unwrap();
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn test_pool_exhaustion_returns_none() {
        let mut pool = VirtualTexturePool::new(512, 256, 256).unwrap();
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_double_release_is_invariant_violation() {
        let mut pool = VirtualTexturePool::new(512, 512, 256).unwrap();
        let id = pool.acquire().unwrap();
        pool.release(id).unwrap();
        assert!(matches!(pool.release(id), Err(Error::InvariantViolated(_))));
    }

    #[test]
    fn test_page_uv_inset() {
        let pool = VirtualTexturePool::new(1024, 1024, 256).unwrap();
        let uv = pool.page_uv(0, 4.0);

        assert!((uv.offset.x - 4.0 / 1024.0).abs() < 1e-6);
        assert!((uv.size.x - 248.0 / 1024.0).abs() < 1e-6);
    }

    #[test]
    fn test_map_to_page_quadrants() {
        let parent = PageKey::new(1, 1, 0);
        let parent_uv = UvRect { offset: Vec2::new(0.5, 0.0), size: Vec2::splat(0.25) };

        // Child (2, 3, 1) is the (1, 1) quadrant of parent (1, 1, 0)
        let uv = map_to_page(&parent_uv, parent, 2, 3, 1);
        assert!((uv.offset - (Vec2::new(0.5, 0.0) + Vec2::splat(0.125))).length() < 1e-6);
        assert!((uv.size - Vec2::splat(0.125)).length() < 1e-6);

        // Mapping a page onto itself is the identity
        let same = map_to_page(&parent_uv, parent, 1, 1, 0);
        assert_eq!(same, parent_uv);
    }
}
