/// CommandList trait and the draw packet it consumes.
///
/// A DrawPacket is the fully resolved form of one draw: geometry ranges over
/// shared buffers plus the material parameters bound for this pass. Passes
/// assemble packets from sorted batches and submit them here; the backend
/// translates them into API draw calls.

use std::sync::Arc;
use crate::error::Result;
use super::device::{
    ClearValue, GpuBuffer, IndexType, PrimitiveTopology, Rect2D, RenderTarget, Viewport,
};

/// One bound material parameter (vec4 register model)
#[derive(Debug, Clone)]
pub struct PacketParam {
    pub name: String,
    pub value: [f32; 4],
}

/// Fully resolved draw call
#[derive(Clone)]
pub struct DrawPacket {
    /// Shared vertex buffer
    pub vertex_buffer: Arc<dyn GpuBuffer>,
    /// Byte offset of the first vertex
    pub vertex_byte_offset: u64,
    /// Number of vertices (used when non-indexed)
    pub vertex_count: u32,
    /// Shared index buffer (None for non-indexed draws)
    pub index_buffer: Option<Arc<dyn GpuBuffer>>,
    /// Byte offset of the first index
    pub index_byte_offset: u64,
    /// Number of indices (0 for non-indexed draws)
    pub index_count: u32,
    /// Index element type
    pub index_type: IndexType,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Material parameters bound for this draw
    pub params: Vec<PacketParam>,
}

impl DrawPacket {
    /// Bind a named vec4 parameter (called by `Material::bind_params`).
    pub fn bind(&mut self, name: &str, value: [f32; 4]) {
        self.params.push(PacketParam { name: name.to_string(), value });
    }
}

/// Command list for recording rendering commands
///
/// Commands are recorded in submission order; the backend decides how they
/// map onto API command buffers.
pub trait CommandList: Send + Sync {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin rendering into a target
    fn begin_target(&mut self, target: &RenderTarget, clear: &[ClearValue]) -> Result<()>;

    /// End rendering into the current target
    fn end_target(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Submit one draw packet
    fn draw_packet(&mut self, packet: &DrawPacket) -> Result<()>;
}
