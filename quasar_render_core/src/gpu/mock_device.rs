/// Mock graphics device (no GPU required)
///
/// A software implementation of the device traits used by the test suite and
/// for headless runs. Buffers store their contents in memory so tests can
/// verify writes; sync objects are signaled manually; the command list keeps
/// a journal of recorded commands for order assertions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use super::command_list::{CommandList, DrawPacket};
use super::device::{
    BlitRegion, BufferDesc, ClearValue, GpuBuffer, GpuTexture, GraphicsDevice, Rect2D,
    RenderTarget, SyncObject, TextureDesc, Viewport,
};

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    desc: BufferDesc,
    data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    fn new(desc: &BufferDesc) -> Self {
        Self {
            desc: desc.clone(),
            data: Mutex::new(vec![0u8; desc.size as usize]),
        }
    }

    /// Snapshot of the buffer contents (test inspection).
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl GpuBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.desc.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.desc.cpu_writable {
            return Err(Error::InvalidResource(
                "write to non-CPU-writable buffer".to_string(),
            ));
        }
        let end = offset + data.len() as u64;
        if end > self.desc.size {
            return Err(Error::CapacityExceeded { requested: end, capacity: self.desc.size });
        }
        let mut store = self.data.lock().unwrap();
        store[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    desc: TextureDesc,
}

impl GpuTexture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

// ============================================================================
// Mock Sync Object
// ============================================================================

pub struct MockSyncObject {
    flag: AtomicBool,
}

impl MockSyncObject {
    /// Mark this fence as signaled (tests stand in for the GPU here).
    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl SyncObject for MockSyncObject {
    fn signaled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

/// Mock device. Tracks created resources and blit operations, and keeps
/// handles to every sync object so tests can signal them all at once.
pub struct MockGraphicsDevice {
    syncs: Mutex<Vec<Arc<MockSyncObject>>>,
    journal: Mutex<Vec<String>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            syncs: Mutex::new(Vec::new()),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Signal every sync object created so far (simulates GPU completion).
    pub fn signal_all_syncs(&self) {
        for sync in self.syncs.lock().unwrap().iter() {
            sync.signal();
        }
    }

    /// Snapshot of the device operation journal (test inspection).
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("zero-sized buffer".to_string()));
        }
        self.record(format!("create_buffer size={} usage={:?}", desc.size, desc.usage));
        Ok(Arc::new(MockBuffer::new(desc)))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn GpuTexture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource("zero-sized texture".to_string()));
        }
        self.record(format!(
            "create_texture {}x{} format={:?}",
            desc.width, desc.height, desc.format
        ));
        Ok(Arc::new(MockTexture { desc: desc.clone() }))
    }

    fn create_sync_object(&self) -> Arc<dyn SyncObject> {
        let sync = Arc::new(MockSyncObject { flag: AtomicBool::new(false) });
        self.syncs.lock().unwrap().push(sync.clone());
        sync
    }

    fn blit(
        &self,
        src: &Arc<dyn GpuTexture>,
        _dst: &Arc<dyn GpuTexture>,
        region: &BlitRegion,
    ) -> Result<()> {
        self.record(format!(
            "blit {}x{} -> ({},{})",
            src.desc().width, src.desc().height, region.dst.x, region.dst.y
        ));
        Ok(())
    }
}

// ============================================================================
// Mock Command List
// ============================================================================

/// Command list that records a journal line per command.
pub struct MockCommandList {
    pub commands: Vec<String>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    /// Journal lines starting with `draw_packet`.
    pub fn draws(&self) -> Vec<&String> {
        self.commands.iter().filter(|c| c.starts_with("draw_packet")).collect()
    }
}

impl Default for MockCommandList {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.commands.push("end".to_string());
        Ok(())
    }

    fn begin_target(&mut self, target: &RenderTarget, _clear: &[ClearValue]) -> Result<()> {
        let kind = if target.color.is_some() { "offscreen" } else { "backbuffer" };
        self.commands.push(format!("begin_target {}", kind));
        Ok(())
    }

    fn end_target(&mut self) -> Result<()> {
        self.commands.push("end_target".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.commands.push(format!(
            "set_viewport {}x{}+{}+{}",
            viewport.width, viewport.height, viewport.x, viewport.y
        ));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.commands.push(format!(
            "set_scissor {}x{}+{}+{}",
            scissor.width, scissor.height, scissor.x, scissor.y
        ));
        Ok(())
    }

    fn draw_packet(&mut self, packet: &DrawPacket) -> Result<()> {
        self.commands.push(format!(
            "draw_packet voff={} icount={} params={}",
            packet.vertex_byte_offset,
            packet.index_count,
            packet.params.len()
        ));
        Ok(())
    }
}
