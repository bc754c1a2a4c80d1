//! A recording [`RasterBackend`] for driving the orchestrator in tests
//! without a real rasterizer.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::objlist::{CoreTag, RenderMode};
use crate::raster::backend::{FpuEntryId, RasterBackend, RenderPass};
use crate::vertex::{DrawParameters, Vertex};

/// One call made against a [`MockBackend`], in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    /// [`RasterBackend::init`].
    Init { tile_w: u32, tile_h: u32 },
    /// [`RasterBackend::clear_buffers`].
    ClearBuffers { background: FpuEntryId, clear_depth: f32 },
    /// [`RasterBackend::clear_param_buffer`].
    ClearParamBuffer,
    /// [`RasterBackend::clear_pixels_drawn`].
    ClearPixelsDrawn,
    /// [`RasterBackend::peel_buffers`].
    PeelBuffers { clear_depth: f32, clear_stencil: u8 },
    /// [`RasterBackend::add_fpu_entry`].
    AddFpuEntry { tag: CoreTag, mode: RenderMode, params: DrawParameters, vtx: Vertex },
    /// [`RasterBackend::rasterize_triangle`].
    RasterizeTriangle { entry: FpuEntryId, vtx: [Vertex; 3], vtx4: Option<Vertex>, parity: u32 },
    /// [`RasterBackend::summarize_stencil_or`].
    SummarizeStencilOr,
    /// [`RasterBackend::summarize_stencil_and`].
    SummarizeStencilAnd,
    /// [`RasterBackend::render_param_tags`].
    RenderParamTags(RenderPass),
    /// [`RasterBackend::clear_fpu_entries`].
    ClearFpuEntries,
}

/// Records every call made against it; reports a caller-controlled number
/// of pixels drawn per peel so layer-peel termination can be exercised
/// without real rasterization.
#[derive(Debug, Default)]
pub struct MockBackend {
    /// The calls made so far, in order.
    pub calls: Vec<Call>,
    /// Queue of values [`RasterBackend::get_pixels_drawn`] returns, popped
    /// front-to-back; once empty, `0` is returned forever (terminating any
    /// layer-peel loop still running).
    pub pixels_drawn_script: RefCell<VecDeque<u32>>,
    next_entry: u32,
    color_buffer: Vec<u8>,
}

impl MockBackend {
    /// A fresh mock with no scripted pixel counts (every peel reports `0`).
    pub fn new() -> Self {
        MockBackend::default()
    }

    /// Script the sequence of values successive [`RasterBackend::get_pixels_drawn`]
    /// calls will return, e.g. to exercise the layer-peel loop for a fixed
    /// number of passes before it sees zero.
    pub fn script_pixels_drawn(&mut self, counts: impl IntoIterator<Item = u32>) {
        *self.pixels_drawn_script.get_mut() = counts.into_iter().collect();
    }
}

impl RasterBackend for MockBackend {
    fn init(&mut self, tile_w: u32, tile_h: u32) {
        self.color_buffer = vec![0u8; (tile_w * tile_h * 4) as usize];
        self.calls.push(Call::Init { tile_w, tile_h });
    }

    fn clear_buffers(&mut self, background: FpuEntryId, clear_depth: f32) {
        self.calls.push(Call::ClearBuffers { background, clear_depth });
    }

    fn clear_param_buffer(&mut self) {
        self.calls.push(Call::ClearParamBuffer);
    }

    fn clear_pixels_drawn(&mut self) {
        self.calls.push(Call::ClearPixelsDrawn);
    }

    fn get_pixels_drawn(&self) -> u32 {
        self.pixels_drawn_script.borrow_mut().pop_front().unwrap_or(0)
    }

    fn peel_buffers(&mut self, clear_depth: f32, clear_stencil: u8) {
        self.calls.push(Call::PeelBuffers { clear_depth, clear_stencil });
    }

    fn add_fpu_entry(&mut self, tag: CoreTag, mode: RenderMode, params: DrawParameters, vtx: Vertex) -> FpuEntryId {
        let id = FpuEntryId(self.next_entry);
        self.next_entry += 1;
        self.calls.push(Call::AddFpuEntry { tag, mode, params, vtx });
        id
    }

    fn rasterize_triangle(&mut self, entry: FpuEntryId, vtx: [Vertex; 3], vtx4: Option<Vertex>, parity: u32) {
        self.calls.push(Call::RasterizeTriangle { entry, vtx, vtx4, parity });
    }

    fn summarize_stencil_or(&mut self) {
        self.calls.push(Call::SummarizeStencilOr);
    }

    fn summarize_stencil_and(&mut self) {
        self.calls.push(Call::SummarizeStencilAnd);
    }

    fn render_param_tags(&mut self, pass: RenderPass) {
        self.calls.push(Call::RenderParamTags(pass));
    }

    fn clear_fpu_entries(&mut self) {
        self.calls.push(Call::ClearFpuEntries);
    }

    fn get_color_output_buffer(&self) -> &[u8] {
        &self.color_buffer
    }
}
