//! The 256-entry polygon type lookup table.
//!
//! Every `obj_ctrl` byte maps onto two independent facts: which of the
//! polygon header layouts (0-4) it uses, and which of the vertex data
//! layouts (0-14) its vertices use. Both are small decision trees over the
//! same four or five [`ObjCtrl`] bits; precomputing them into a flat table
//! at construction time, the way the reference builds its FSM alongside it,
//! means the hot per-command path is a single array index rather than a
//! chain of branches.

use crate::error::TaError;
use crate::ta::pcw::ObjCtrl;

/// Whether a polygon header is the 32-byte or 64-byte layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderSize {
    /// 32-byte polygon header.
    Sz32,
    /// 64-byte polygon header (textured-with-offset or two-volume cases).
    Sz64,
}

/// Decoded shape of one `obj_ctrl` byte's polygon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolyType {
    /// Which of the 15 vertex data layouts this polygon's vertices use.
    pub data_type_id: u8,
    /// Which of the 5 polygon header layouts this polygon uses.
    pub header_type: u8,
    /// The header's own size.
    pub header_size: HeaderSize,
}

/// Classify a polygon header's vertex data layout (helpers 0-14 in the
/// reference): textured vs. untextured, one vs. two volumes, the color
/// encoding, and 16 vs. 32-bit UVs.
///
/// Returns an error for the one combination the hardware defines no
/// layout for: `Col_Type == 1` (floating color) together with `Volume ==
/// 1` (two volumes).
pub fn poly_data_type_id(obj_ctrl: ObjCtrl) -> Result<u8, TaError> {
    let col_type = obj_ctrl.col_type();
    if obj_ctrl.texture() {
        if !obj_ctrl.volume() {
            Ok(match (col_type, obj_ctrl.uv_16bit()) {
                (0, false) => 3,
                (0, true) => 4,
                (1, false) => 5,
                (1, true) => 6,
                (_, false) => 7,
                (_, true) => 8,
            })
        } else {
            match (col_type, obj_ctrl.uv_16bit()) {
                (0, false) => Ok(11),
                (0, true) => Ok(12),
                (1, _) => Err(TaError::InvalidColTypeVolumeCombination),
                (_, false) => Ok(13),
                (_, true) => Ok(14),
            }
        }
    } else if !obj_ctrl.volume() {
        Ok(match col_type {
            0 => 0,
            1 => 1,
            _ => 2,
        })
    } else {
        match col_type {
            0 => Ok(9),
            1 => Err(TaError::InvalidColTypeVolumeCombination),
            _ => Ok(10),
        }
    }
}

/// Classify a polygon header's own layout (helpers 0-4 in the reference).
///
/// Returns an error for the same `Col_Type == 1 && Volume == 1`
/// combination `poly_data_type_id` rejects.
pub fn poly_header_type_size(obj_ctrl: ObjCtrl) -> Result<(u8, HeaderSize), TaError> {
    if !obj_ctrl.volume() {
        let col_type = obj_ctrl.col_type();
        if col_type < 2 {
            Ok((0, HeaderSize::Sz32))
        } else if col_type == 2 {
            if obj_ctrl.texture() && obj_ctrl.offset() {
                Ok((2, HeaderSize::Sz64))
            } else {
                Ok((1, HeaderSize::Sz32))
            }
        } else {
            Ok((0, HeaderSize::Sz32))
        }
    } else {
        match obj_ctrl.col_type() {
            0 => Ok((3, HeaderSize::Sz32)),
            2 => Ok((4, HeaderSize::Sz64)),
            3 => Ok((3, HeaderSize::Sz32)),
            _ => Err(TaError::InvalidColTypeVolumeCombination),
        }
    }
}

/// The flattened 256-entry polygon type table, one slot per `obj_ctrl`
/// byte.
///
/// Reserved `obj_ctrl` combinations (`Col_Type == 1 && Volume == 1`) are
/// stored as `None`; the FSM builder treats such cells the same way the
/// reference treats its `0xFFFFFFFF` sentinel, by never transitioning a
/// polygon header into them.
pub struct TypeLut {
    entries: [Option<PolyType>; 256],
}

impl TypeLut {
    /// Compute the table once. Cheap enough (256 small branches) to build
    /// per [`crate::ta::TaChannel`] rather than share globally; see the
    /// module-level Design Notes on avoiding process-wide mutable state.
    pub fn build() -> Self {
        let mut entries = [None; 256];
        for (i, slot) in entries.iter_mut().enumerate() {
            let obj_ctrl = ObjCtrl::new(i as u8);
            *slot = match (poly_data_type_id(obj_ctrl), poly_header_type_size(obj_ctrl)) {
                (Ok(data_type_id), Ok((header_type, header_size))) => Some(PolyType {
                    data_type_id,
                    header_type,
                    header_size,
                }),
                _ => None,
            };
        }
        TypeLut { entries }
    }

    /// Look up the decoded shape for a raw `obj_ctrl` byte.
    pub fn get(&self, obj_ctrl: ObjCtrl) -> Option<PolyType> {
        self.entries[obj_ctrl.bits() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untextured_single_volume_packed_color() {
        let oc = ObjCtrl::new(0); // texture=0, volume=0, col_type=0
        assert_eq!(poly_data_type_id(oc), Ok(0));
        assert_eq!(poly_header_type_size(oc), Ok((0, HeaderSize::Sz32)));
    }

    #[test]
    fn col_type_one_with_volume_is_invalid() {
        // Volume=1 (bit0), Col_Type=1 (bits1-2 == 01)
        let oc = ObjCtrl::new(0b0000_0011);
        assert_eq!(
            poly_data_type_id(oc),
            Err(TaError::InvalidColTypeVolumeCombination)
        );
        assert_eq!(
            poly_header_type_size(oc),
            Err(TaError::InvalidColTypeVolumeCombination)
        );
    }

    #[test]
    fn textured_offset_intensity_is_64_byte_header() {
        // Texture=1 (bit3), Offset=1 (bit4), Col_Type=2 (bits1-2 == 10)
        let oc = ObjCtrl::new(0b0001_1100);
        assert_eq!(poly_header_type_size(oc), Ok((2, HeaderSize::Sz64)));
    }

    #[test]
    fn table_covers_every_byte_and_matches_direct_call() {
        let lut = TypeLut::build();
        for i in 0..=255u8 {
            let oc = ObjCtrl::new(i);
            let direct = match (poly_data_type_id(oc), poly_header_type_size(oc)) {
                (Ok(d), Ok((h, sz))) => Some(PolyType {
                    data_type_id: d,
                    header_type: h,
                    header_size: sz,
                }),
                _ => None,
            };
            assert_eq!(lut.get(oc), direct);
        }
    }

    #[test]
    fn reserved_combination_is_none_in_table() {
        let lut = TypeLut::build();
        let oc = ObjCtrl::new(0b0000_0011);
        assert_eq!(lut.get(oc), None);
    }
}
