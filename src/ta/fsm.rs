//! The 8-state TA front-end finite state machine.
//!
//! The transition table is generated once, at construction, and from then
//! on treated as pure data: advancing the FSM is a single array index plus
//! a handful of bit tests, never a branch over `ParaType`. Cells the
//! generator never visits are left poisoned so a stray lookup panics
//! loudly instead of silently returning state `0`.

use crate::ta::lut::{HeaderSize, TypeLut};
use crate::ta::pcw::{ObjCtrl, ParaType};

/// One of the FSM's 8 states. The `Half` variants mean "the second 32
/// bytes of a 64-byte entity are still pending."
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    /// Neutral: no list open.
    Neutral = 0,
    /// Open polygon list, expecting 32-byte vertices.
    PolyV32 = 1,
    /// Open polygon list, expecting 64-byte vertices.
    PolyV64 = 2,
    /// Open modifier volume list, 64-byte vertices.
    ModVolV64 = 3,
    /// Mid-way through a 64-byte polygon header, to resume as `PolyV32`.
    PolyHalfV32 = 4,
    /// Mid-way through a 64-byte polygon header, to resume as `PolyV64`.
    PolyHalfV64 = 5,
    /// Mid-way through a 64-byte vertex, to resume as `PolyV64`.
    PolyV64Half = 6,
    /// Mid-way through a 64-byte modifier volume vertex, to resume as
    /// `ModVolV64`.
    ModVolV64Half = 7,
}

impl State {
    fn from_index(bits: u8) -> State {
        match bits {
            0 => State::Neutral,
            1 => State::PolyV32,
            2 => State::PolyV64,
            3 => State::ModVolV64,
            4 => State::PolyHalfV32,
            5 => State::PolyHalfV64,
            6 => State::PolyV64Half,
            _ => State::ModVolV64Half,
        }
    }
}

const TABLE_LEN: usize = 2048;
const POISON_BIT: u8 = 0x80;
const MUST_HANDLE_BIT: u8 = 0x10;

fn index(state: State, para_bits: u8, obj_hi5: u8) -> usize {
    ((state as usize) << 8) | ((para_bits as usize) << 5) | (obj_hi5 as usize)
}

/// A `(next_state, must_handle)` pair read out of the table, or the
/// generator's poison marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The state to commit to.
    pub next: State,
    /// Whether the command handler must run before the transition commits.
    pub must_handle: bool,
}

/// The precomputed 2048-cell transition table.
pub struct TransitionTable {
    cells: [u8; TABLE_LEN],
}

impl TransitionTable {
    /// Build the table, following the same generator shape as the 256-entry
    /// type LUT's construction: an explicit rule per `ParaType`, each rule
    /// covering every state/`obj_ctrl` combination it applies to.
    pub fn build(type_lut: &TypeLut) -> Self {
        let mut cells = [0u8; TABLE_LEN];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = ((i >> 8) as u8) | POISON_BIT;
        }

        let mut fill_one =
            |cells: &mut [u8; TABLE_LEN], state: State, para_bits: u8, obj: u8, next: State, must_handle: bool| {
                let mut v = next as u8;
                if must_handle {
                    v |= MUST_HANDLE_BIT;
                }
                cells[index(state, para_bits, obj)] = v;
            };

        // End_Of_List: from any open or neutral state, back to Neutral.
        for &state in &[State::Neutral, State::PolyV32, State::PolyV64, State::ModVolV64] {
            for obj in 0..32u8 {
                fill_one(&mut cells, state, ParaType::EndOfList.to_bits(), obj, State::Neutral, true);
            }
        }

        // User_Tile_Clip / Object_List_Set: 32-byte no-ops, no state change.
        for &para in &[ParaType::UserTileClip, ParaType::ObjectListSet] {
            for &state in &[State::Neutral, State::PolyV32, State::PolyV64, State::ModVolV64] {
                for obj in 0..32u8 {
                    fill_one(&mut cells, state, para.to_bits(), obj, state, false);
                }
            }
        }

        // Polygon_or_Modifier_Volume: the type LUT picks the 32/64-bit
        // header and vertex sub-state per `obj_ctrl`.
        for k in 0..32u8 {
            let obj_ctrl = ObjCtrl::new(k * 4);
            if let Some(poly) = type_lut.get(obj_ctrl) {
                let v64 = matches!(poly.data_type_id, 5 | 6 | 11 | 12 | 13 | 14);
                let p64 = poly.header_size == HeaderSize::Sz64;
                let next = match (p64, v64) {
                    (true, false) => State::PolyHalfV32,
                    (true, true) => State::PolyHalfV64,
                    (false, false) => State::PolyV32,
                    (false, true) => State::PolyV64,
                };
                fill_one(&mut cells, State::PolyV32, ParaType::PolygonOrModifierVolume.to_bits(), k, next, false);
                fill_one(&mut cells, State::PolyV64, ParaType::PolygonOrModifierVolume.to_bits(), k, next, false);
            }
            // Reserved `obj_ctrl` combinations (Col_Type==1 && Volume==1)
            // are left poisoned: no polygon type exists to transition into.
        }
        for obj in 0..32u8 {
            fill_one(&mut cells, State::ModVolV64, ParaType::PolygonOrModifierVolume.to_bits(), obj, State::ModVolV64, false);
            fill_one(&mut cells, State::Neutral, ParaType::PolygonOrModifierVolume.to_bits(), obj, State::Neutral, true);
        }

        // Sprite: 32-byte header, 64-byte vertex data.
        for obj in 0..32u8 {
            fill_one(&mut cells, State::PolyV32, ParaType::Sprite.to_bits(), obj, State::PolyV64, false);
            fill_one(&mut cells, State::PolyV64, ParaType::Sprite.to_bits(), obj, State::PolyV64, false);
            fill_one(&mut cells, State::Neutral, ParaType::Sprite.to_bits(), obj, State::Neutral, true);
        }

        // Vertex_Parameter: invalid from Neutral (left poisoned).
        for obj in 0..32u8 {
            fill_one(&mut cells, State::PolyV32, ParaType::VertexParameter.to_bits(), obj, State::PolyV32, false);
            fill_one(&mut cells, State::PolyV64, ParaType::VertexParameter.to_bits(), obj, State::PolyV64Half, false);
            fill_one(&mut cells, State::ModVolV64, ParaType::VertexParameter.to_bits(), obj, State::ModVolV64Half, false);
        }

        // Half-states: any (ParaType, obj) resumes the full state, since
        // the second half of a 64-byte entity carries no header tag.
        for para in 0..8u8 {
            for obj in 0..32u8 {
                fill_one(&mut cells, State::PolyHalfV32, para, obj, State::PolyV32, false);
                fill_one(&mut cells, State::PolyHalfV64, para, obj, State::PolyV64, false);
                fill_one(&mut cells, State::PolyV64Half, para, obj, State::PolyV64, false);
                fill_one(&mut cells, State::ModVolV64Half, para, obj, State::ModVolV64, false);
            }
        }

        TransitionTable { cells }
    }

    /// Read the cell for `(state, para_bits, (obj_ctrl >> 2) & 31)`.
    ///
    /// Returns `None` for a poisoned cell: either a reserved `ParaType`
    /// (`3`, `6`), a reserved polygon type, or a transition the generator
    /// never defines (e.g. a vertex arriving with no list open).
    pub fn get(&self, state: State, para_bits: u8, obj_hi5: u8) -> Option<Transition> {
        let cell = self.cells[index(state, para_bits, obj_hi5)];
        if cell & POISON_BIT != 0 {
            None
        } else {
            Some(Transition {
                next: State::from_index(cell & 0x7),
                must_handle: cell & MUST_HANDLE_BIT != 0,
            })
        }
    }
}
