//! Object lists: inline linked lists of object descriptors, each pointing
//! at an object's parameters and vertices.
//!
//! An object descriptor's own 32-bit word carries just enough to dispatch
//! to one of four shapes — strip, triangle array, quad array, or link —
//! and to locate the parameter data each shape decodes via
//! [`crate::vertex::decode_object`]. The exact bit layout below is this
//! crate's own encoding (see the note on [`crate::region::ListPointer`]);
//! what matters is the shape each variant decodes into.

use log::warn;

use crate::vertex::{decode_object, DrawParameters, Vertex};
use crate::vram::Vram;

/// Which render list a triangle is being emitted for; threaded through to
/// the rasterizer back-end so it can pick the right color/depth mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Depth-first, no blending.
    Opaque,
    /// Depth + color, alpha test gated.
    PunchThrough,
    /// Layer-peeled, alpha blended.
    Translucent,
    /// Modifier volume: writes stencil, not color.
    Modifier,
}

/// The handful of fields the FPU tag cache keys polygons on, mirroring
/// `ISP_BACKGND_T`'s own shape so the background polygon and ordinary
/// polygons can share one tagging scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreTag {
    /// Whether the polygon bypasses the texture cache.
    pub cache_bypass: bool,
    /// Shadow (double-volume) decoding was used for this polygon.
    pub shadow: bool,
    /// Vertex stride skip, as decoded from the object descriptor.
    pub skip: u32,
    /// VRAM address of this polygon's parameter words.
    pub tag_address: u32,
    /// Which decoded vertex carries the tag (always `0` except for strips,
    /// which tag from the first surviving vertex of each triangle).
    pub tag_offset: u32,
}

/// One triangle ready for the rasterizer: its parameters, tag, winding
/// parity, and three (or four, for quads) vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleInstance {
    /// Decoded ISP/TSP/TCW parameters.
    pub params: DrawParameters,
    /// This triangle's FPU tag key.
    pub tag: CoreTag,
    /// Winding parity passed to the rasterizer (alternates across a strip).
    pub parity: u32,
    /// The three vertices.
    pub vtx: [Vertex; 3],
    /// A fourth vertex, present only when this instance came from a quad;
    /// the rasterizer back-end is responsible for splitting it.
    pub vtx4: Option<Vertex>,
}

enum Descriptor {
    Strip { shadow: bool, skip: u32, mask: u8, param_offs_words: u32 },
    TriangleArray { shadow: bool, skip: u32, prims: u32, param_offs_words: u32 },
    QuadArray { shadow: bool, skip: u32, prims: u32, param_offs_words: u32 },
    Link { end_of_list: bool, next_block_ptr_words: u32 },
    Unknown(u32),
}

fn decode_descriptor(word: u32) -> Descriptor {
    let is_not_strip = (word >> 31) & 1 != 0;
    if !is_not_strip {
        return Descriptor::Strip {
            shadow: (word >> 28) & 1 != 0,
            skip: (word >> 25) & 0x7,
            mask: ((word >> 19) & 0x3F) as u8,
            param_offs_words: word & 0x0007_FFFF,
        };
    }
    match (word >> 29) & 0x3 {
        0 => Descriptor::TriangleArray {
            shadow: (word >> 28) & 1 != 0,
            skip: (word >> 25) & 0x7,
            prims: (word >> 19) & 0x3F,
            param_offs_words: word & 0x0007_FFFF,
        },
        1 => Descriptor::QuadArray {
            shadow: (word >> 28) & 1 != 0,
            skip: (word >> 25) & 0x7,
            prims: (word >> 19) & 0x3F,
            param_offs_words: word & 0x0007_FFFF,
        },
        2 => Descriptor::Link {
            end_of_list: word & 1 != 0,
            next_block_ptr_words: (word >> 1) & 0x3FFF_FFFF,
        },
        _ => Descriptor::Unknown(word),
    }
}

/// Walk one object list starting at `base` (a VRAM byte address), calling
/// `emit` for every triangle decoded.
///
/// `param_base` is the base address object descriptor param offsets are
/// relative to; `intensity_shadow_enabled` gates shadow decoding per
/// `FPU_SHAD_SCALE`, same as [`crate::vertex::decode_object`]. Unknown
/// descriptor types are logged and treated as an implicit link terminator,
/// since there is no reliable way to know how many words such an entry
/// occupies.
pub fn walk_object_list<F: FnMut(RenderMode, TriangleInstance)>(
    vram: &Vram,
    param_base: u32,
    mut base: u32,
    render_mode: RenderMode,
    intensity_shadow_enabled: bool,
    mut emit: F,
) {
    loop {
        let word = vram.vri(base);
        base += 4;

        match decode_descriptor(word) {
            Descriptor::Strip { shadow, skip, mask, param_offs_words } => {
                let tag_address = param_base + param_offs_words * 4;
                let (params, vtx, _) = decode_object(vram, tag_address, skip, shadow, intensity_shadow_enabled, 8);
                for i in 0..6usize {
                    if mask & (1 << (5 - i)) == 0 {
                        continue;
                    }
                    let tag = CoreTag {
                        cache_bypass: params.isp.cache_bypass(),
                        shadow,
                        skip,
                        tag_address,
                        tag_offset: i as u32,
                    };
                    emit(
                        render_mode,
                        TriangleInstance {
                            params,
                            tag,
                            parity: (i & 1) as u32,
                            vtx: [vtx[i], vtx[i + 1], vtx[i + 2]],
                            vtx4: None,
                        },
                    );
                }
            }
            Descriptor::TriangleArray { shadow, skip, prims, param_offs_words } => {
                let mut ptr = param_base + param_offs_words * 4;
                for _ in 0..=prims {
                    let tag_address = ptr;
                    let (params, vtx, next) = decode_object(vram, tag_address, skip, shadow, intensity_shadow_enabled, 3);
                    ptr = next;
                    let tag = CoreTag { cache_bypass: params.isp.cache_bypass(), shadow, skip, tag_address, tag_offset: 0 };
                    emit(
                        render_mode,
                        TriangleInstance { params, tag, parity: 0, vtx: [vtx[0], vtx[1], vtx[2]], vtx4: None },
                    );
                }
            }
            Descriptor::QuadArray { shadow, skip, prims, param_offs_words } => {
                let mut ptr = param_base + param_offs_words * 4;
                for _ in 0..=prims {
                    let tag_address = ptr;
                    let (params, vtx, next) = decode_object(vram, tag_address, skip, shadow, intensity_shadow_enabled, 4);
                    ptr = next;
                    let tag = CoreTag { cache_bypass: params.isp.cache_bypass(), shadow, skip, tag_address, tag_offset: 0 };
                    emit(
                        render_mode,
                        TriangleInstance {
                            params,
                            tag,
                            parity: 0,
                            vtx: [vtx[0], vtx[1], vtx[2]],
                            vtx4: Some(vtx[3]),
                        },
                    );
                }
            }
            Descriptor::Link { end_of_list, next_block_ptr_words } => {
                if end_of_list {
                    return;
                }
                base = next_block_ptr_words * 4;
            }
            Descriptor::Unknown(word) => {
                warn!("object list: unhandled descriptor word {:#010x}; stopping list", word);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_descriptor_round_trips() {
        let word = (0u32 << 31) | (1 << 28) | (3 << 25) | (0b10_1010 << 19) | 100;
        match decode_descriptor(word) {
            Descriptor::Strip { shadow, skip, mask, param_offs_words } => {
                assert!(shadow);
                assert_eq!(skip, 3);
                assert_eq!(mask, 0b10_1010);
                assert_eq!(param_offs_words, 100);
            }
            _ => panic!("expected strip"),
        }
    }

    #[test]
    fn link_descriptor_round_trips() {
        let word = (1u32 << 31) | (2 << 29) | (500 << 1) | 1;
        match decode_descriptor(word) {
            Descriptor::Link { end_of_list, next_block_ptr_words } => {
                assert!(end_of_list);
                assert_eq!(next_block_ptr_words, 500);
            }
            _ => panic!("expected link"),
        }
    }

    #[test]
    fn walk_stops_at_end_of_list_link() {
        let mut vram = Vram::new(4096);
        // A single unconditional link with end_of_list set, no triangles.
        let link = (1u32 << 31) | (2 << 29) | 1;
        vram.write_u32_linear(0, link);

        let mut count = 0;
        walk_object_list(&vram, 0, 0, RenderMode::Opaque, true, |_mode, _tri| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn unknown_descriptor_stops_the_walk() {
        let mut vram = Vram::new(4096);
        let unknown = (1u32 << 31) | (3 << 29); // reserved type tag
        vram.write_u32_linear(0, unknown);
        vram.write_u32_linear(4, (1u32 << 31) | (2 << 29) | 1); // would be a valid terminator

        let mut count = 0;
        walk_object_list(&vram, 0, 0, RenderMode::Opaque, true, |_mode, _tri| count += 1);
        assert_eq!(count, 0);
    }
}
