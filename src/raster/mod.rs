//! The CORE tile-based deferred rasterizer: walks the region array, decodes
//! each tile's object lists, and drives a pluggable back-end through the
//! fixed per-tile rendering sequence.
//!
//! See [`crate::ta`] for the front-end that produces the parameter buffers
//! this half consumes once a region entry points at them.

pub mod backend;
mod orchestrator;

#[cfg(any(test, feature = "mock-backend"))]
pub mod mock;

pub use backend::{BackendFactory, FpuEntryId, RasterBackend, RenderPass};
pub use orchestrator::{render_tile, WriteoutTask, MAX_PEEL_PASSES, TILE_SIZE};
