/// Landscape virtual-texture page manager.
///
/// Maintains a bounded pool of fixed-size texture pages covering the
/// landscape quadtree at multiple LOD levels. Only pages actually needed
/// this frame are resident; rendering new pages is rate-limited by a
/// per-frame budget, and pool pressure is resolved by a two-tier eviction
/// policy (stale pages first, then visible-but-lower-priority ones).
///
/// Requests are frame-transient: whatever the budget leaves unprocessed is
/// dropped at the end of `process_requests`, and callers re-request every
/// frame for as long as a page is needed. When no page can be freed for the
/// highest-priority pending request, none of the lower-priority ones can
/// succeed either (stale eviction is priority-independent and was already
/// tried), so processing stops for the frame.

use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::gpu::{
    BlitRegion, GpuTexture, GraphicsDevice, Rect2D, TextureDesc, TextureFormat, TextureUsage,
};
use crate::render_debug;
use super::page_renderer::{
    LandscapePageRenderer, PageComponent, PageRenderParams, PageRenderTarget,
};
use super::subdivision::LandscapeSubdivision;
use super::virtual_texture::{map_to_page, PageKey, UvRect, VirtualTexturePool};

/// Virtual texture dimensions and layer layout.
#[derive(Debug, Clone)]
pub struct VirtualTextureConfig {
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub page_size: u32,
    /// Mip levels kept for the atlas; drives the page border inset
    pub mip_level_count: u32,
    /// One atlas + intermediate target per layer (e.g. albedo, normal)
    pub layer_formats: Vec<TextureFormat>,
}

impl Default for VirtualTextureConfig {
    fn default() -> Self {
        Self {
            atlas_width: 2048,
            atlas_height: 2048,
            page_size: 256,
            mip_level_count: 3,
            layer_formats: vec![TextureFormat::R8G8B8A8_UNORM, TextureFormat::R8G8B8A8_UNORM],
        }
    }
}

/// Residency record for one page.
#[derive(Debug, Clone, Copy)]
pub struct ResidentPage {
    /// Pool slot holding the page's texels
    pub page_id: u32,
    /// Frame the page was last requested (touch) or rendered
    pub last_update_frame: u64,
    /// Priority it was requested with
    pub priority: u32,
}

/// Transient page update request; cleared every frame.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest {
    pub key: PageKey,
    pub priority: u32,
}

/// UV mapping of a requested tile onto a resident page.
#[derive(Debug, Clone, Copy)]
pub struct PageMapping {
    /// The resident page supplying the texels
    pub key: PageKey,
    /// Atlas UV rect addressing the requested tile's data
    pub uv: UvRect,
}

/// Result of a suitable-page lookup: the best coarse fallback plus the
/// exact-level mapping when that page is resident.
#[derive(Debug, Clone, Copy)]
pub struct SuitablePage {
    pub fallback: PageMapping,
    pub exact: Option<PageMapping>,
}

/// Manages page residency, update scheduling and compositing.
pub struct LandscapePageManager {
    device: Arc<dyn GraphicsDevice>,
    config: VirtualTextureConfig,
    pool: VirtualTexturePool,
    /// One atlas texture per layer
    atlas: Vec<Arc<dyn GpuTexture>>,
    /// Ping-ponged intermediate targets shared by all page renders
    intermediate: [PageRenderTarget; 2],
    resident: FxHashMap<PageKey, ResidentPage>,
    requests: Vec<UpdateRequest>,
    requested: FxHashSet<PageKey>,
    frame_index: u64,
}

impl LandscapePageManager {
    pub fn new(device: Arc<dyn GraphicsDevice>, config: VirtualTextureConfig) -> Result<Self> {
        let pool =
            VirtualTexturePool::new(config.atlas_width, config.atlas_height, config.page_size)?;

        let mut atlas = Vec::with_capacity(config.layer_formats.len());
        for &format in &config.layer_formats {
            atlas.push(device.create_texture(&TextureDesc {
                width: config.atlas_width,
                height: config.atlas_height,
                format,
                usage: TextureUsage::RenderTarget,
                mip_levels: config.mip_level_count,
            })?);
        }

        let intermediate = [
            PageRenderTarget::new(&device, config.page_size, &config.layer_formats)?,
            PageRenderTarget::new(&device, config.page_size, &config.layer_formats)?,
        ];

        Ok(Self {
            device,
            config,
            pool,
            atlas,
            intermediate,
            resident: FxHashMap::default(),
            requests: Vec::new(),
            requested: FxHashSet::default(),
            frame_index: 1,
        })
    }

    /// Atlas texture for one layer.
    pub fn atlas_layer(&self, layer: usize) -> &Arc<dyn GpuTexture> {
        &self.atlas[layer]
    }

    /// Border inset in texels: half a texel per atlas mip level, so the mip
    /// chain can filter page borders without bleeding into neighbors.
    pub fn texel_inset(&self) -> f32 {
        0.5 * (1u32 << self.config.mip_level_count) as f32
    }

    /// Advance to the next frame. Must run before this frame's requests.
    pub fn begin_frame(&mut self) {
        self.frame_index += 1;
    }

    /// Current frame index.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Request a page for this frame.
    ///
    /// A resident page is touched (its residency refreshed) at no cost —
    /// this is how still-visible pages stay alive frame over frame. A
    /// non-resident page is enqueued for `process_requests`. Duplicate
    /// requests for the same key within one frame are deduplicated.
    pub fn request_page(&mut self, level: u32, x: u32, y: u32, priority: u32) {
        let key = PageKey::new(level, x, y);

        if let Some(resident) = self.resident.get_mut(&key) {
            resident.last_update_frame = self.frame_index;
            return;
        }

        if !self.requested.insert(key) {
            render_debug!(
                "quasar3d::LandscapePageManager",
                "duplicate page request ({}, {}, {}) this frame",
                level, x, y
            );
            return;
        }

        self.requests.push(UpdateRequest { key, priority });
    }

    /// Number of requests pending this frame (diagnostics).
    pub fn pending_request_count(&self) -> usize {
        self.requests.len()
    }

    /// Whether a page is currently resident.
    pub fn is_resident(&self, level: u32, x: u32, y: u32) -> bool {
        self.resident.contains_key(&PageKey::new(level, x, y))
    }

    /// Number of resident pages.
    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Free pool slots.
    pub fn available_pages(&self) -> u32 {
        self.pool.available()
    }

    /// Process up to `max_page_updates` pending requests, highest priority
    /// first. Returns the number of pages rendered.
    ///
    /// All remaining requests are cleared afterwards; callers re-request
    /// next frame for pages they still need.
    pub fn process_requests(
        &mut self,
        subdivision: &LandscapeSubdivision,
        renderers: &mut [&mut dyn LandscapePageRenderer],
        max_page_updates: u32,
        component: PageComponent,
    ) -> Result<u32> {
        let mut requests = std::mem::take(&mut self.requests);
        requests.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut processed = 0u32;
        for request in &requests {
            if processed >= max_page_updates {
                break;
            }

            let page_id = match self.pool.acquire() {
                Some(id) => id,
                None => {
                    if self.try_free_page(request.priority)?.is_none() {
                        // Nothing evictable for the highest-priority request
                        // left — lower-priority ones cannot do better.
                        break;
                    }
                    self.pool.acquire().ok_or_else(|| {
                        Error::invariant(
                            "quasar3d::LandscapePageManager",
                            "freed page slot not acquirable",
                        )
                    })?
                }
            };

            self.render_page(request.key, page_id, subdivision, renderers, component)?;
            self.resident.insert(
                request.key,
                ResidentPage {
                    page_id,
                    last_update_frame: self.frame_index,
                    priority: request.priority,
                },
            );
            processed += 1;
        }

        // Frame-transient: unprocessed requests are dropped, not carried over
        self.requested.clear();
        Ok(processed)
    }

    /// Two-tier eviction. Tier 1: the lowest-priority page not touched this
    /// frame (truly stale). Tier 2: the lowest-priority page that IS visible
    /// this frame but has lower priority than the incoming request — visible
    /// pop-in traded for the higher-priority page. Returns the freed slot.
    fn try_free_page(&mut self, incoming_priority: u32) -> Result<Option<u32>> {
        let stale = self
            .resident
            .iter()
            .filter(|(_, r)| r.last_update_frame < self.frame_index)
            .min_by_key(|(k, r)| (r.priority, k.raw()))
            .map(|(k, _)| *k);

        let victim = stale.or_else(|| {
            self.resident
                .iter()
                .filter(|(_, r)| {
                    r.last_update_frame == self.frame_index && r.priority < incoming_priority
                })
                .min_by_key(|(k, r)| (r.priority, k.raw()))
                .map(|(k, _)| *k)
        });

        let Some(victim) = victim else {
            return Ok(None);
        };

        let Some(record) = self.resident.remove(&victim) else {
            return Ok(None);
        };
        self.pool.release(record.page_id)?;
        Ok(Some(record.page_id))
    }

    /// Render one page: compute its bounds, run every registered renderer
    /// against the ping-ponged intermediates, then blit the composite into
    /// the pool slot.
    fn render_page(
        &mut self,
        key: PageKey,
        page_id: u32,
        subdivision: &LandscapeSubdivision,
        renderers: &mut [&mut dyn LandscapePageRenderer],
        component: PageComponent,
    ) -> Result<()> {
        let world_box = subdivision.page_world_box(key.level(), key.x(), key.y());

        // The page's quadrant within its parent tile's footprint
        let relative_uv = if key.level() == 0 {
            UvRect::full()
        } else {
            UvRect {
                offset: glam::Vec2::new(
                    (key.x() & 1) as f32 * 0.5,
                    (key.y() & 1) as f32 * 0.5,
                ),
                size: glam::Vec2::splat(0.5),
            }
        };

        // Ping-pong compositing: each renderer reads the previous output
        // and writes blended output; the swap is gated on actual writes.
        let mut read = 0usize;
        let mut write = 1usize;
        for renderer in renderers.iter_mut() {
            let params = PageRenderParams {
                source: &self.intermediate[read],
                destination: &self.intermediate[write],
                relative_uv,
                world_box,
                lod: key.level(),
                page_pixel_size: self.config.page_size,
                component,
            };
            if renderer.render_page(&params) {
                std::mem::swap(&mut read, &mut write);
            }
        }

        // Final composite lives on the read side; blit every layer into the
        // page's atlas rectangle
        let (dst_x, dst_y, size) = self.pool.page_rect(page_id);
        let region = BlitRegion {
            src: Rect2D { x: 0, y: 0, width: size, height: size },
            dst: Rect2D { x: dst_x as i32, y: dst_y as i32, width: size, height: size },
        };
        for (layer, atlas) in self.atlas.iter().enumerate() {
            self.device.blit(self.intermediate[read].layer(layer), atlas, &region)?;
        }

        Ok(())
    }

    /// Exact-or-fallback lookup for a tile.
    ///
    /// Walks up the quadtree from the requested level until a page that is
    /// resident AND touched this frame is found, returning the UV mapping of
    /// the requested tile within it. `exact` is set when the requested level
    /// itself was found. `None` means not even a coarse ancestor is ready.
    pub fn get_suitable_page(&self, level: u32, x: u32, y: u32) -> Option<SuitablePage> {
        let texel_inset = self.texel_inset();
        let requested = PageKey::new(level, x, y);

        let mut key = requested;
        loop {
            if let Some(record) = self.resident.get(&key) {
                if record.last_update_frame == self.frame_index {
                    let page_uv = self.pool.page_uv(record.page_id, texel_inset);
                    let uv = map_to_page(&page_uv, key, level, x, y);
                    let mapping = PageMapping { key, uv };
                    return Some(SuitablePage {
                        fallback: mapping,
                        exact: (key == requested).then_some(mapping),
                    });
                }
            }
            key = key.parent()?;
        }
    }

    /// Explicitly evict one page (terrain edited under it).
    pub fn invalidate_page(&mut self, level: u32, x: u32, y: u32) -> Result<bool> {
        let key = PageKey::new(level, x, y);
        match self.resident.remove(&key) {
            Some(record) => {
                self.pool.release(record.page_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop every resident page (LOD thresholds changed, terrain reloaded).
    pub fn invalidate_all(&mut self) {
        self.resident.clear();
        self.pool.release_all();
        self.requests.clear();
        self.requested.clear();
    }
}

#[cfg(test)]
#[path = "page_manager_tests.rs"]
mod tests;
