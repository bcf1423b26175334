/// Landscape page renderer contract.
///
/// Rendering one virtual-texture page is a mini multi-pass composite: every
/// registered renderer (base terrain layers, then decals) runs in order
/// against a pair of ping-ponged intermediate targets, reading the previous
/// renderer's output and writing further blended output. The buffers swap
/// only when a renderer reports that it actually wrote.

use std::sync::Arc;
use crate::error::Result;
use crate::gpu::{GpuTexture, GraphicsDevice, TextureDesc, TextureFormat, TextureUsage};
use crate::scene::AABB;
use super::virtual_texture::UvRect;

/// What kind of landscape content a page update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageComponent {
    /// Terrain albedo/normal/height layers
    Terrain,
    /// Decoration/decal layers composited on top
    Decoration,
}

/// One set of intermediate page-sized render targets (one texture per
/// virtual-texture layer).
pub struct PageRenderTarget {
    layers: Vec<Arc<dyn GpuTexture>>,
}

impl PageRenderTarget {
    /// Allocate page-sized targets, one per layer format.
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        page_size: u32,
        layer_formats: &[TextureFormat],
    ) -> Result<Self> {
        let mut layers = Vec::with_capacity(layer_formats.len());
        for &format in layer_formats {
            layers.push(device.create_texture(&TextureDesc {
                width: page_size,
                height: page_size,
                format,
                usage: TextureUsage::RenderTarget,
                mip_levels: 1,
            })?);
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Arc<dyn GpuTexture>] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> &Arc<dyn GpuTexture> {
        &self.layers[index]
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

/// Everything a page renderer needs for one page update.
pub struct PageRenderParams<'a> {
    /// Previous renderer's output (read)
    pub source: &'a PageRenderTarget,
    /// This renderer's output (write)
    pub destination: &'a PageRenderTarget,
    /// The page's sub-rect within its parent tile's footprint
    pub relative_uv: UvRect,
    /// World-space bounds of the terrain under the page
    pub world_box: AABB,
    /// Quadtree level of the page
    pub lod: u32,
    /// Page edge length in texels
    pub page_pixel_size: u32,
    /// Content kind being updated
    pub component: PageComponent,
}

/// A renderer invoked for every page update (terrain layers, decals, ...).
pub trait LandscapePageRenderer: Send + Sync {
    /// Render into `params.destination`, reading `params.source` as needed.
    ///
    /// Returns whether anything was written — this gates the ping-pong
    /// buffer swap, so a renderer that had nothing to contribute leaves the
    /// previous composite intact.
    fn render_page(&mut self, params: &PageRenderParams<'_>) -> bool;
}
