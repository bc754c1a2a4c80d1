//! Renderer configuration surface.
//!
//! The core itself never reads a config file or environment variable; a
//! [`RendererConfig`] is a plain value the embedder builds and hands in,
//! following the same pattern as [`crate::registers::PvrRegisters`].
//! Keeping parsing out of this crate means it has no opinion about TOML,
//! JSON, or any other on-disk format — only about the shape of its own
//! tunables.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for the tile worker pool and the writeout support matrix.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RendererConfig {
    /// Number of tile worker threads. `0` runs the orchestrator
    /// synchronously on the calling thread, per §4.8.
    pub worker_count: usize,
    /// Total size of the VRAM buffer, in bytes.
    pub vram_size: usize,
    /// Framebuffer writeout configurations considered supported; any
    /// region entry requesting a writeout outside this matrix fails with
    /// [`crate::error::FramebufferError`] instead of being approximated.
    pub supported_writeout: WriteoutSupport,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            worker_count: default_worker_count(),
            vram_size: 16 * 1024 * 1024,
            supported_writeout: WriteoutSupport::default(),
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The subset of framebuffer writeout configurations the reference
/// algorithm implements; this mirrors the hard-coded checks in the
/// original rasterizer rather than adding configurability the algorithm
/// doesn't actually have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WriteoutSupport {
    /// The only supported `FB_W_CTRL.fb_packmode` value.
    pub pack_mode: u32,
    /// Whether horizontal scaling may ever be requested (always `false`).
    pub allow_hscale: bool,
    /// Whether interlaced output may ever be requested (always `false`).
    pub allow_interlace: bool,
    /// The set of `SCALER_CTL.vscalefactor` values accepted.
    pub vscale_factors: [u32; 3],
}

impl Default for WriteoutSupport {
    fn default() -> Self {
        WriteoutSupport {
            pack_mode: 0x1,
            allow_hscale: false,
            allow_interlace: false,
            vscale_factors: [0x400, 0x401, 0x800],
        }
    }
}

impl WriteoutSupport {
    /// Whether `factor` is one of the accepted vertical scale factors.
    pub fn accepts_vscale(&self, factor: u32) -> bool {
        self.vscale_factors.contains(&factor)
    }
}
