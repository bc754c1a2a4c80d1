//! The Parameter Control Word and its subfields.
//!
//! Every 32-byte command word begins with a PCW: a tag that says what kind
//! of parameter follows (a polygon header, a vertex, an end-of-list marker)
//! and, for polygon headers, how that polygon's data is laid out. The FSM
//! and type LUT in sibling modules are both just precomputed views over the
//! handful of bits modeled here.

use crate::error::TaError;

/// The 3-bit `ParaType` tag, naming what a command word's payload is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParaType {
    /// Marks the end of the currently open list.
    EndOfList,
    /// A user tile clip rectangle; 32 bytes, no state change.
    UserTileClip,
    /// An object list set pointer; 32 bytes, no state change.
    ObjectListSet,
    /// A polygon or modifier volume header, opening or continuing a list.
    PolygonOrModifierVolume,
    /// A sprite (quad) header.
    Sprite,
    /// A vertex belonging to the currently open list.
    VertexParameter,
}

impl ParaType {
    /// Decode the 3-bit field, rejecting the two reserved values.
    pub fn from_bits(bits: u8) -> Result<Self, TaError> {
        match bits {
            0 => Ok(ParaType::EndOfList),
            1 => Ok(ParaType::UserTileClip),
            2 => Ok(ParaType::ObjectListSet),
            4 => Ok(ParaType::PolygonOrModifierVolume),
            5 => Ok(ParaType::Sprite),
            7 => Ok(ParaType::VertexParameter),
            other => Err(TaError::InvalidParaType(other)),
        }
    }

    /// The 3-bit encoding, as used to index the FSM table.
    pub fn to_bits(self) -> u8 {
        match self {
            ParaType::EndOfList => 0,
            ParaType::UserTileClip => 1,
            ParaType::ObjectListSet => 2,
            ParaType::PolygonOrModifierVolume => 4,
            ParaType::Sprite => 5,
            ParaType::VertexParameter => 7,
        }
    }
}

/// The 3-bit `ListType` tag, naming which of the five draw lists a header
/// belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListType {
    /// Opaque polygons, depth-tested front to back with no blending.
    Opaque,
    /// Opaque modifier volumes, affecting the opaque list's stencil state.
    OpaqueModifierVolume,
    /// Alpha-blended polygons, layer-peeled back to front.
    Translucent,
    /// Modifier volumes affecting the translucent list.
    TranslucentModifierVolume,
    /// Punch-through (1-bit alpha test) polygons.
    PunchThrough,
}

impl ListType {
    /// Decode the 3-bit field. `7` is the channel's "no list open yet"
    /// sentinel and is rejected here; callers test for it separately.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(ListType::Opaque),
            1 => Some(ListType::OpaqueModifierVolume),
            2 => Some(ListType::Translucent),
            3 => Some(ListType::TranslucentModifierVolume),
            4 => Some(ListType::PunchThrough),
            _ => None,
        }
    }

    /// The 3-bit encoding.
    pub fn to_bits(self) -> u8 {
        match self {
            ListType::Opaque => 0,
            ListType::OpaqueModifierVolume => 1,
            ListType::Translucent => 2,
            ListType::TranslucentModifierVolume => 3,
            ListType::PunchThrough => 4,
        }
    }

    /// Whether this list carries modifier volumes rather than drawable
    /// polygons; such lists use the 64-byte-only vertex path.
    pub fn is_modifier_volume(self) -> bool {
        matches!(
            self,
            ListType::OpaqueModifierVolume | ListType::TranslucentModifierVolume
        )
    }
}

/// The low byte of a polygon header PCW: the fields that decide the
/// header's own size and the vertex layout that follows it.
///
/// Field order matches the bit layout the hardware defines (`Volume` is
/// bit 0, `Shadow` is bit 7), so `ObjCtrl::from(pcw.full)` and the raw
/// `obj_ctrl` byte used to index the type LUT agree bit-for-bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjCtrl(u8);

impl ObjCtrl {
    /// Wrap a raw `obj_ctrl` byte.
    pub fn new(bits: u8) -> Self {
        ObjCtrl(bits)
    }

    /// The raw byte, as used to index the 256-entry type LUT.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Two-volume (modifier-affected) polygon, rather than single-volume.
    pub fn volume(self) -> bool {
        self.0 & 0x1 != 0
    }

    /// Color encoding: `0` packed ARGB, `1` floating, `2` intensity, `3`
    /// reserved (only valid for single-volume, non-modifier polygons).
    pub fn col_type(self) -> u8 {
        (self.0 >> 1) & 0x3
    }

    /// Whether the polygon is textured.
    pub fn texture(self) -> bool {
        (self.0 >> 3) & 0x1 != 0
    }

    /// Whether a per-polygon UV offset is present (only meaningful when
    /// textured, intensity-colored).
    pub fn offset(self) -> bool {
        (self.0 >> 4) & 0x1 != 0
    }

    /// Gouraud (per-vertex) vs. flat shading.
    pub fn gouraud(self) -> bool {
        (self.0 >> 5) & 0x1 != 0
    }

    /// 16-bit (vs. 32-bit) UV coordinate encoding.
    pub fn uv_16bit(self) -> bool {
        (self.0 >> 6) & 0x1 != 0
    }

    /// Shadow (double-volume intensity) polygon.
    pub fn shadow(self) -> bool {
        (self.0 >> 7) & 0x1 != 0
    }
}

/// A decoded Parameter Control Word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pcw {
    full: u32,
}

impl Pcw {
    /// Wrap a raw 32-bit PCW as read from the first word of a command.
    pub fn new(full: u32) -> Self {
        Pcw { full }
    }

    /// The raw word.
    pub fn bits(self) -> u32 {
        self.full
    }

    /// Bits 31:29.
    pub fn para_type_bits(self) -> u8 {
        ((self.full >> 29) & 0x7) as u8
    }

    /// Decoded `ParaType`, or an error for the two reserved encodings.
    pub fn para_type(self) -> Result<ParaType, TaError> {
        ParaType::from_bits(self.para_type_bits())
    }

    /// Bit 28, set on the last vertex of a triangle/quad strip.
    pub fn end_of_strip(self) -> bool {
        (self.full >> 28) & 0x1 != 0
    }

    /// Bits 26:24, the list this header opens or continues.
    pub fn list_type_bits(self) -> u8 {
        ((self.full >> 24) & 0x7) as u8
    }

    /// Decoded `ListType`, or `None` for the reserved/"unset" encoding.
    pub fn list_type(self) -> Option<ListType> {
        ListType::from_bits(self.list_type_bits())
    }

    /// The low byte, decoded as polygon layout control bits.
    pub fn obj_ctrl(self) -> ObjCtrl {
        ObjCtrl::new((self.full & 0xFF) as u8)
    }
}
