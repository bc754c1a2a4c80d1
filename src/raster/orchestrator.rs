//! Single-tile rendering: the fixed nine-step sequence that turns one
//! region entry into a rasterized 32x32 tile and, unless suppressed, a
//! writeout task.

use log::debug;

use crate::objlist::{walk_object_list, RenderMode};
use crate::raster::backend::{RasterBackend, RenderPass};
use crate::region::RegionEntry;
use crate::registers::PvrRegisters;
use crate::vertex::decode_object;
use crate::vram::Vram;

/// Tile width and height in pixels; fixed by the tile-based architecture.
pub const TILE_SIZE: u32 = 32;

/// The maximum number of translucent layer-peel passes per tile.
///
/// The back-end's pixels-drawn counter always terminates the loop earlier
/// in practice; this cap exists purely so a pathological input (every pass
/// draws pixels, e.g. many coincident triangles at the same depth) cannot
/// hang a worker.
pub const MAX_PEEL_PASSES: u32 = 60;

/// A rasterized tile's color output, queued for the main-thread writeout
/// pass.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteoutTask {
    /// Tile column, in 32-pixel units.
    pub tile_x: u32,
    /// Tile row, in 32-pixel units.
    pub tile_y: u32,
    /// RGBA8, `TILE_SIZE * TILE_SIZE * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Render one region entry's tile against `backend`, returning a
/// [`WriteoutTask`] unless the entry has `no_writeout` set.
///
/// Runs steps 1-9 of the tile orchestration in order: background
/// registration, optional clear, opaque/punch-through/opaque-modifier
/// rasterization, the opaque span-sort, translucent layer peeling capped at
/// [`MAX_PEEL_PASSES`], writeout snapshot, and tag cache invalidation.
pub fn render_tile(vram: &Vram, regs: &PvrRegisters, entry: RegionEntry, backend: &mut dyn RasterBackend) -> Option<WriteoutTask> {
    debug!("rendering tile ({}, {})", entry.tile_x, entry.tile_y);
    backend.debug_on_tile_start(entry.tile_x, entry.tile_y);

    let shadow_enabled = regs.intensity_shadow_enabled();

    // Step 1: register the background polygon. It supplies the tile's clear
    // color through the tag cache alone; it is never rasterized.
    let bg_tag_address = regs.param_base + regs.bg_tag_address() * 4;
    let (bg_params, bg_vtx, _) = decode_object(
        vram,
        bg_tag_address,
        regs.bg_skip(),
        regs.bg_shadow(),
        shadow_enabled,
        8,
    );
    let bg_tag = crate::objlist::CoreTag {
        cache_bypass: regs.bg_cache_bypass(),
        shadow: regs.bg_shadow() && shadow_enabled,
        skip: regs.bg_skip(),
        tag_address: bg_tag_address,
        tag_offset: regs.bg_tag_offset(),
    };
    let bg_entry = backend.add_fpu_entry(bg_tag, RenderMode::Opaque, bg_params, bg_vtx[regs.bg_tag_offset() as usize]);

    // Step 2: clear, unless this tile keeps the previous one's depth data.
    if !entry.z_keep {
        backend.clear_buffers(bg_entry, regs.isp_backgnd_d);
    }

    // Step 3: opaque.
    if !entry.opaque.is_empty() {
        walk_object_list(vram, regs.param_base, entry.opaque.ptr(), RenderMode::Opaque, shadow_enabled, |mode, tri| {
            let fpu = backend.add_fpu_entry(tri.tag, mode, tri.params, tri.vtx[0]);
            backend.rasterize_triangle(fpu, tri.vtx, tri.vtx4, tri.parity);
        });
    }

    // Step 4: punch-through.
    if !entry.puncht.is_empty() {
        walk_object_list(vram, regs.param_base, entry.puncht.ptr(), RenderMode::PunchThrough, shadow_enabled, |mode, tri| {
            let fpu = backend.add_fpu_entry(tri.tag, mode, tri.params, tri.vtx[0]);
            backend.rasterize_triangle(fpu, tri.vtx, tri.vtx4, tri.parity);
        });
    }

    // Step 5: opaque modifier volumes.
    if !entry.opaque_mod.is_empty() {
        walk_object_list(vram, regs.param_base, entry.opaque_mod.ptr(), RenderMode::Modifier, shadow_enabled, |mode, tri| {
            let fpu = backend.add_fpu_entry(tri.tag, mode, tri.params, tri.vtx[0]);
            backend.rasterize_triangle(fpu, tri.vtx, tri.vtx4, tri.parity);
            match tri.params.isp.modvol_volume_mode() {
                1 => backend.summarize_stencil_or(),
                2 => backend.summarize_stencil_and(),
                _ => {}
            }
        });
    }

    // Step 6: shade the opaque/punch-through/modifier pass.
    backend.render_param_tags(RenderPass::Opaque);

    // Step 7: layer-peeled translucent pass.
    if !entry.trans.is_empty() {
        for pass in 0..MAX_PEEL_PASSES {
            backend.clear_param_buffer();
            backend.clear_pixels_drawn();
            backend.peel_buffers(regs.isp_backgnd_d, 0);

            walk_object_list(vram, regs.param_base, entry.trans.ptr(), RenderMode::Translucent, shadow_enabled, |mode, tri| {
                let fpu = backend.add_fpu_entry(tri.tag, mode, tri.params, tri.vtx[0]);
                backend.rasterize_triangle(fpu, tri.vtx, tri.vtx4, tri.parity);
            });
            if !entry.trans_mod.is_empty() {
                walk_object_list(vram, regs.param_base, entry.trans_mod.ptr(), RenderMode::Modifier, shadow_enabled, |mode, tri| {
                    let fpu = backend.add_fpu_entry(tri.tag, mode, tri.params, tri.vtx[0]);
                    backend.rasterize_triangle(fpu, tri.vtx, tri.vtx4, tri.parity);
                    match tri.params.isp.modvol_volume_mode() {
                        1 => backend.summarize_stencil_or(),
                        2 => backend.summarize_stencil_and(),
                        _ => {}
                    }
                });
            }

            backend.render_param_tags(RenderPass::Translucent);

            if backend.get_pixels_drawn() == 0 {
                break;
            }
            if pass + 1 == MAX_PEEL_PASSES {
                debug!("tile ({}, {}) hit the layer-peel cap", entry.tile_x, entry.tile_y);
            }
        }
    }

    // Step 8: snapshot and queue the writeout.
    let writeout = if entry.no_writeout {
        None
    } else {
        Some(WriteoutTask {
            tile_x: entry.tile_x,
            tile_y: entry.tile_y,
            pixels: backend.get_color_output_buffer().to_vec(),
        })
    };

    // Step 9: invalidate the tag cache.
    backend.clear_fpu_entries();

    writeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::backend::RasterBackend;
    use crate::raster::mock::{Call, MockBackend};

    #[test]
    fn empty_tile_runs_steps_in_order_and_skips_peeling() {
        let vram = Vram::new(4096);
        let regs = PvrRegisters::default();
        let entry = RegionEntry {
            tile_x: 0,
            tile_y: 0,
            z_keep: false,
            no_writeout: false,
            last_region: true,
            opaque: crate::region::ListPointer::from_raw(0x8000_0000),
            opaque_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            trans: crate::region::ListPointer::from_raw(0x8000_0000),
            trans_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            puncht: crate::region::ListPointer::from_raw(0x8000_0000),
        };

        let mut backend = MockBackend::new();
        backend.init(TILE_SIZE, TILE_SIZE);
        let writeout = render_tile(&vram, &regs, entry, &mut backend);

        assert!(writeout.is_some());
        assert_eq!(writeout.unwrap().pixels.len(), (TILE_SIZE * TILE_SIZE * 4) as usize);

        // Background registration (tag cache only, never rasterized), clear,
        // opaque span-sort, then cache invalidation; no peeling since every
        // list pointer is empty.
        assert!(matches!(backend.calls[0], Call::Init { .. }));
        assert!(matches!(backend.calls[1], Call::AddFpuEntry { .. }));
        assert!(matches!(backend.calls[2], Call::ClearBuffers { .. }));
        assert!(matches!(backend.calls[3], Call::RenderParamTags(RenderPass::Opaque)));
        assert!(matches!(backend.calls[4], Call::ClearFpuEntries));
        assert!(!backend.calls.iter().any(|c| matches!(c, Call::RasterizeTriangle { .. })));
    }

    #[test]
    fn no_writeout_flag_suppresses_the_task() {
        let vram = Vram::new(4096);
        let regs = PvrRegisters::default();
        let entry = RegionEntry {
            tile_x: 1,
            tile_y: 1,
            z_keep: true,
            no_writeout: true,
            last_region: true,
            opaque: crate::region::ListPointer::from_raw(0x8000_0000),
            opaque_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            trans: crate::region::ListPointer::from_raw(0x8000_0000),
            trans_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            puncht: crate::region::ListPointer::from_raw(0x8000_0000),
        };

        let mut backend = MockBackend::new();
        backend.init(TILE_SIZE, TILE_SIZE);
        let writeout = render_tile(&vram, &regs, entry, &mut backend);
        assert!(writeout.is_none());
        // z_keep means no ClearBuffers call.
        assert!(!backend.calls.iter().any(|c| matches!(c, Call::ClearBuffers { .. })));
    }

    #[test]
    fn layer_peel_loop_stops_at_cap_when_pixels_never_reach_zero() {
        let mut vram = Vram::new(4096);
        // An immediate end-of-list link: each peel's object-list walk
        // terminates without emitting any triangles, so only the mock's
        // scripted pixel counts drive the loop.
        vram.write_u32_linear(0, (1u32 << 31) | (2 << 29) | 1);
        let mut regs = PvrRegisters::default();
        regs.fpu_param_cfg = 1 << 21; // v2 region entries, so trans can be non-empty below
        let entry = RegionEntry {
            tile_x: 0,
            tile_y: 0,
            z_keep: true,
            no_writeout: true,
            last_region: true,
            opaque: crate::region::ListPointer::from_raw(0x8000_0000),
            opaque_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            trans: crate::region::ListPointer::from_raw(0), // not empty: points at offset 0
            trans_mod: crate::region::ListPointer::from_raw(0x8000_0000),
            puncht: crate::region::ListPointer::from_raw(0x8000_0000),
        };

        let mut backend = MockBackend::new();
        backend.init(TILE_SIZE, TILE_SIZE);
        // Every peel reports at least one pixel drawn; the loop must still
        // terminate at MAX_PEEL_PASSES rather than looping forever.
        backend.script_pixels_drawn(std::iter::repeat(1).take(1000));

        render_tile(&vram, &regs, entry, &mut backend);

        let peel_count = backend.calls.iter().filter(|c| matches!(c, Call::PeelBuffers { .. })).count();
        assert_eq!(peel_count, MAX_PEEL_PASSES as usize);
    }
}
