/// Graphics device traits and resource descriptors.
///
/// Implemented by backend-specific types. The render core owns resources as
/// `Arc<dyn ...>` trait objects; a resource is destroyed when the last
/// reference drops.

use std::sync::Arc;
use crate::error::Result;

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform/constant buffer
    Uniform,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// CPU-writable (host-visible) memory
    pub cpu_writable: bool,
}

/// Texture pixel formats used by the render core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_UNORM,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    D32_SFLOAT,
}

/// Texture usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled in shaders
    Sampled,
    /// Color render target (also sampleable)
    RenderTarget,
    /// Depth/stencil attachment
    DepthStencil,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub mip_levels: u32,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    LineList,
}

/// Buffer resource trait
pub trait GpuBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Write data at a byte offset.
    ///
    /// Only valid for buffers created with `cpu_writable`.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Texture resource trait
pub trait GpuTexture: Send + Sync {
    /// Creation descriptor
    fn desc(&self) -> &TextureDesc;
}

/// GPU completion fence.
///
/// Created unsignaled; the backend signals it when the GPU has consumed all
/// work submitted before its creation. Checking is non-blocking — the render
/// core never waits on one of these.
pub trait SyncObject: Send + Sync {
    fn signaled(&self) -> bool;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-size viewport with the default depth range.
    pub fn with_size(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height, min_depth: 0.0, max_depth: 1.0 }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Render target binding: color + depth attachments.
///
/// `None` for both means the backend's default backbuffer.
#[derive(Clone, Default)]
pub struct RenderTarget {
    pub color: Option<Arc<dyn GpuTexture>>,
    pub depth: Option<Arc<dyn GpuTexture>>,
}

/// Region for a texture-to-texture blit
#[derive(Debug, Clone, Copy)]
pub struct BlitRegion {
    pub src: Rect2D,
    pub dst: Rect2D,
}

/// Graphics device factory trait
///
/// Creates GPU resources and performs transfer operations. All methods take
/// `&self`; backends handle their own internal synchronization.
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>>;

    /// Create a texture
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn GpuTexture>>;

    /// Create a fence covering all work submitted so far this frame
    fn create_sync_object(&self) -> Arc<dyn SyncObject>;

    /// Copy a region from one texture to another (virtual-texture page blits)
    fn blit(
        &self,
        src: &Arc<dyn GpuTexture>,
        dst: &Arc<dyn GpuTexture>,
        region: &BlitRegion,
    ) -> Result<()>;
}
