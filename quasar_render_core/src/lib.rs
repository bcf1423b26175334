/*!
# Quasar Render Core

Real-time render-graph core for the Quasar 3D engine: spatial culling,
render-batch sorting, multi-pass rendering, landscape virtual-texture paging
and per-frame transient GPU buffer allocation.

The GPU is reached through a narrow trait surface (`gpu` module); backends
implement it, and a software mock ships with the crate for tests and
headless runs.

## Architecture

- **RenderSystem**: top-level per-frame driver and context owner
- **RenderHierarchy**: authoritative object set + octree frustum culling
- **RenderBatchArray / RenderLayerManager**: per-layer draw-order policies
- **PassManager**: forward / shadow-cascade / water passes in priority order
- **LandscapePageManager**: bounded virtual-texture page residency
- **DynamicBufferAllocator**: fence-gated transient vertex/index pages
*/

// Internal modules
mod error;

pub mod buffer;
pub mod camera;
pub mod gpu;
pub mod landscape;
pub mod light;
pub mod log;
pub mod material;
pub mod pass;
pub mod render_system;
pub mod scene;
pub mod utils;

// Main quasar3d namespace module
pub mod quasar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Top-level driver
    pub use crate::render_system::{RenderContext, RenderSystem};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Camera and culling
    pub mod camera {
        pub use crate::camera::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Pass sub-module
    pub mod pass {
        pub use crate::pass::*;
    }

    // Landscape virtual texturing
    pub mod landscape {
        pub use crate::landscape::*;
    }

    // Lights and shadows
    pub mod light {
        pub use crate::light::*;
    }

    // GPU interface + mock device
    pub mod gpu {
        pub use crate::gpu::*;
    }

    // Transient buffers
    pub mod buffer {
        pub use crate::buffer::*;
    }

    // Material contract
    pub mod material {
        pub use crate::material::*;
    }
}

pub use error::{Error, Result};

// Re-export math library at crate root
pub use glam;
