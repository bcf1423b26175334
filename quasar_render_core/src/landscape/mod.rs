/// Landscape virtual-texture module — page residency, scheduling and
/// compositing for terrain/decal content.

mod page_manager;
mod page_renderer;
mod subdivision;
mod virtual_texture;

pub use page_manager::{
    LandscapePageManager, PageMapping, ResidentPage, SuitablePage, UpdateRequest,
    VirtualTextureConfig,
};
pub use page_renderer::{
    LandscapePageRenderer, PageComponent, PageRenderParams, PageRenderTarget,
};
pub use subdivision::{Heightmap, LandscapeSubdivision};
pub use virtual_texture::{map_to_page, AtlasPage, PageKey, UvRect, VirtualTexturePool};
