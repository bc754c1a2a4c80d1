//! The pluggable rasterizer back-end contract.
//!
//! The orchestrator drives one of these per tile, one instance per worker
//! thread — a back-end is never shared across threads, since it owns a
//! tile's private color/depth/stencil/tag buffers as mutable state. No part
//! of that state is observable to the orchestrator except through the
//! methods below.

use crate::objlist::{CoreTag, RenderMode};
use crate::vertex::{DrawParameters, Vertex};

/// A handle to a polygon registered via [`RasterBackend::add_fpu_entry`],
/// opaque to the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FpuEntryId(pub u32);

/// Which span-sort pass [`RasterBackend::render_param_tags`] should run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPass {
    /// Depth-first opaque/punch-through/modifier pass.
    Opaque,
    /// Layer-peeled translucent pass; keeps an index for coplanar sort.
    Translucent,
}

/// One tile's worth of rasterizer state machine.
///
/// Implementations back a single 32x32 tile at a time; [`Self::init`] is
/// called once per back-end, the remaining methods once per tile per the
/// sequence in [`crate::raster::orchestrator`].
pub trait RasterBackend {
    /// One-time setup; `tile_w`/`tile_h` are the fixed tile dimensions this
    /// back-end will be asked to render (32x32 for this crate).
    fn init(&mut self, tile_w: u32, tile_h: u32);

    /// Clear color, tag, depth, and stencil buffers ahead of a tile,
    /// seeding every pixel with the background polygon's tag and the given
    /// clear depth.
    fn clear_buffers(&mut self, background: FpuEntryId, clear_depth: f32);

    /// Clear the per-pass parameter/tag buffer (run before every
    /// translucent peel).
    fn clear_param_buffer(&mut self);

    /// Reset the pixels-drawn counter (run before every translucent peel).
    fn clear_pixels_drawn(&mut self);

    /// Pixels written by the rasterizer since the last
    /// [`Self::clear_pixels_drawn`]; drives layer-peel termination.
    fn get_pixels_drawn(&self) -> u32;

    /// Copy depth to the depth-reference buffer, then clear depth and
    /// stencil, ahead of the next peel's rasterization.
    fn peel_buffers(&mut self, clear_depth: f32, clear_stencil: u8);

    /// Register a polygon's tag and shading parameters, returning a handle
    /// later [`Self::rasterize_triangle`] calls reference.
    ///
    /// `vtx` is the single vertex that supplies this entry's shading data to
    /// the tag cache (a strip triangle's first vertex, an array/modifier
    /// triangle's `vtx[0]`, or the background polygon's vertex at
    /// `tag_offset`) — not necessarily a vertex this entry ever rasterizes.
    fn add_fpu_entry(&mut self, tag: CoreTag, mode: RenderMode, params: DrawParameters, vtx: Vertex) -> FpuEntryId;

    /// Rasterize one triangle (or, with `vtx4` set, a quad split into two)
    /// under the given entry's tag, with the supplied winding parity.
    fn rasterize_triangle(&mut self, entry: FpuEntryId, vtx: [Vertex; 3], vtx4: Option<Vertex>, parity: u32);

    /// OR this polygon's coverage into the modifier volume stencil.
    fn summarize_stencil_or(&mut self);

    /// AND this polygon's coverage into the modifier volume stencil.
    fn summarize_stencil_and(&mut self);

    /// Span-sort and shade the current pass's tags into the tile color
    /// buffer.
    fn render_param_tags(&mut self, pass: RenderPass);

    /// Invalidate every registered FPU tag entry, ahead of the next tile.
    fn clear_fpu_entries(&mut self);

    /// The tile's RGBA8 color output, `tile_w * tile_h * 4` bytes.
    fn get_color_output_buffer(&self) -> &[u8];

    /// Called once before the first tile of a frame; purely diagnostic.
    fn debug_on_frame_start(&mut self) {}

    /// Called once before each tile; purely diagnostic.
    fn debug_on_tile_start(&mut self, tile_x: u32, tile_y: u32) {
        let _ = (tile_x, tile_y);
    }
}

/// Constructs a fresh, independent back-end for one worker.
///
/// Supplied once at pool construction; the pool calls it once per worker
/// thread so each gets its own private buffers.
pub trait BackendFactory: Send + Sync {
    /// The concrete back-end type this factory produces.
    type Backend: RasterBackend + Send;

    /// Build a new back-end instance.
    fn create(&self) -> Self::Backend;
}

impl<B, F> BackendFactory for F
where
    F: Fn() -> B + Send + Sync,
    B: RasterBackend + Send,
{
    type Backend = B;

    fn create(&self) -> B {
        (self)()
    }
}
