//! Error types returned across the crate's public edges.
//!
//! Internal, tolerated conditions (malformed TA input, unexpected object
//! list entries) are logged and absorbed rather than surfaced here — see the
//! module docs on [`crate::ta`] and [`crate::objlist`]. Only conditions that
//! must stop a caller are represented as a typed error.

use thiserror::Error;

/// Malformed tile accelerator command input.
///
/// These are never returned from the streaming entry points
/// ([`crate::ta::TaChannel::push_word`]) — malformed input is logged and
/// tolerated there, per the propagation policy. This type exists so tests
/// and tooling built on top of the FSM tables can name the same conditions
/// the channel logs about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TaError {
    /// `ParaType` was one of the two reserved values (3 or 6).
    #[error("invalid ParaType {0}")]
    InvalidParaType(u8),
    /// The PCW requested `Col_Type == 1 && Volume == 1`, which has no
    /// defined polygon type.
    #[error("invalid obj_ctrl combination: Col_Type=1 with Volume=1")]
    InvalidColTypeVolumeCombination,
    /// A `Vertex_Parameter` word arrived while the channel was in the
    /// neutral state (no list open).
    #[error("vertex parameter received with no list open")]
    VertexWithNoList,
}

/// The region entry requested a framebuffer writeout configuration the
/// reference rasterizer does not implement.
///
/// Unlike [`TaError`], this one *is* returned from the public API: the
/// reference algorithm treats unsupported output configurations as fatal,
/// per the error handling design (§7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FramebufferError {
    /// `FB_W_CTRL.fb_packmode` was not `0x1` (565 RGB16).
    #[error("unsupported framebuffer pack mode {0:#x}, only 0x1 (565) is implemented")]
    UnsupportedPackMode(u32),
    /// `SCALER_CTL.hscale` was set; horizontal scaling is not implemented.
    #[error("unsupported horizontal scale factor")]
    UnsupportedHScale,
    /// `SCALER_CTL.interlace` was set; interlaced output is not implemented.
    #[error("unsupported interlace mode")]
    UnsupportedInterlace,
    /// `SCALER_CTL.vscalefactor` was not one of `0x400`, `0x401`, `0x800`.
    #[error("unsupported vertical scale factor {0:#x}")]
    UnsupportedVScale(u32),
}

/// A worker or main-thread queue was used in a way that violates the pool's
/// lifecycle contract.
///
/// These are programming errors (§7 "pool misuse"): the reference asserts
/// and aborts on the equivalent conditions, but this crate surfaces them as
/// an ordinary `Result` from [`crate::pool::TilePool::render_frame`] instead
/// of panicking, so an embedder driving the pool from a long-lived process
/// can report and recover rather than crash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A tile was enqueued on a pool that has zero workers and was never
    /// started for threaded operation.
    #[error("enqueued a tile onto a pool with no worker threads")]
    PoolNotRunning,
    /// A tile or writeout was enqueued after the pool had been signaled to
    /// stop.
    #[error("enqueued work after the pool was stopped")]
    PoolStopped,
}
