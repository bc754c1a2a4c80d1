//! A single TA input channel: FSM state, the open list marker, and the
//! accumulated parameter buffer.
//!
//! The reference keeps this state in process-wide globals (`ta_cur_state`,
//! `ta_fsm_cl`, the thread-local `tactx`); this crate makes the channel an
//! explicit, owned value instead; see the Design Notes on avoiding
//! process-wide mutable state.

use log::warn;

use crate::error::TaError;
use crate::ta::fsm::{State, TransitionTable};
use crate::ta::interrupt::{InterruptId, InterruptSink};
use crate::ta::lut::TypeLut;
use crate::ta::pcw::{ListType, ParaType, Pcw};

/// The length in bytes of a single TA command word.
pub const WORD_LEN: usize = 32;

/// A streaming TA front-end: feed it 32-byte command words, read back the
/// accumulated parameter buffer once a list ends.
///
/// A fresh channel starts in the neutral state with an empty buffer, which
/// is already the state [`TaChannel::list_init`] produces; data arriving
/// before any explicit list-init is therefore handled the same way the
/// reference's implicit `ListInit` is, with no special case needed here.
pub struct TaChannel {
    state: State,
    table: TransitionTable,
    type_lut: TypeLut,
    list_type: Option<ListType>,
    buffer: Vec<u8>,
    committed_len: usize,
}

impl TaChannel {
    /// Build a channel with a freshly generated transition table and type
    /// LUT, in the neutral state.
    pub fn new() -> Self {
        let type_lut = TypeLut::build();
        let table = TransitionTable::build(&type_lut);
        TaChannel {
            state: State::Neutral,
            table,
            type_lut,
            list_type: None,
            buffer: Vec::new(),
            committed_len: 0,
        }
    }

    /// The channel's current FSM state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The polygon type LUT this channel's table was built from, for
    /// callers decoding vertex data that need the same classification.
    pub fn type_lut(&self) -> &TypeLut {
        &self.type_lut
    }

    /// Bytes accumulated since the last committed list boundary.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Force the FSM back to neutral without touching the buffer or list
    /// marker.
    pub fn soft_reset(&mut self) {
        self.state = State::Neutral;
    }

    /// Start a fresh list: drop the accumulated buffer, clear the list
    /// marker, and reset the FSM.
    pub fn list_init(&mut self) {
        self.buffer.clear();
        self.committed_len = 0;
        self.list_type = None;
        self.state = State::Neutral;
    }

    /// Resume after a partial submission: keep the buffer up to the last
    /// committed list boundary, clear the list marker, and reset the FSM.
    pub fn list_continue(&mut self) {
        self.buffer.truncate(self.committed_len);
        self.list_type = None;
        self.state = State::Neutral;
    }

    /// Feed one 32-byte command word through the FSM, appending it to the
    /// buffer first unconditionally.
    ///
    /// Raises the appropriate [`InterruptId`] on `sink` when a list ends.
    /// Malformed input — a reserved `ParaType`, a reserved polygon type, or
    /// a vertex with no list open — is logged and tolerated rather than
    /// returned: the FSM stays in its current state and the word is kept in
    /// the buffer regardless, per the error handling design (§7).
    pub fn push_word(&mut self, word: &[u8; WORD_LEN], sink: &mut dyn InterruptSink) {
        self.buffer.extend_from_slice(word);

        let pcw = Pcw::new(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
        let para_type = match pcw.para_type() {
            Ok(pt) => pt,
            Err(e) => {
                warn!("malformed TA command word: {}", e);
                return;
            }
        };
        let obj_ctrl = pcw.obj_ctrl();
        let obj_hi5 = (obj_ctrl.bits() >> 2) & 0x1F;

        if para_type == ParaType::VertexParameter && self.state == State::Neutral {
            warn!("malformed TA command word: {}", TaError::VertexWithNoList);
            return;
        }

        let cell = match self.table.get(self.state, para_type.to_bits(), obj_hi5) {
            Some(cell) => cell,
            None => {
                warn!(
                    "malformed TA command word: {}",
                    TaError::InvalidColTypeVolumeCombination
                );
                return;
            }
        };

        if !cell.must_handle {
            self.state = cell.next;
            return;
        }

        self.handle(para_type, pcw, obj_hi5, cell.next, sink);
    }

    /// Feed a run of bytes broken into 32-byte words, as DMA-driven entry
    /// does.
    ///
    /// `data.len()` must be a multiple of [`WORD_LEN`]; an unaligned tail is
    /// a caller contract violation (a DMA engine misconfiguration), not
    /// tolerated guest input, so this asserts rather than returning an
    /// error the caller could silently ignore.
    pub fn push_bytes(&mut self, data: &[u8], sink: &mut dyn InterruptSink) {
        assert!(
            data.len() % WORD_LEN == 0,
            "TA burst length {} is not a multiple of {WORD_LEN}",
            data.len()
        );
        for chunk in data.chunks_exact(WORD_LEN) {
            let mut word = [0u8; WORD_LEN];
            word.copy_from_slice(chunk);
            self.push_word(&word, sink);
        }
    }

    /// Run the command handler for a `must_handle` transition: establish
    /// the list type if this is the first header, raise interrupts on
    /// list end, and re-read the table with the post-handler state to get
    /// the real next state.
    fn handle(
        &mut self,
        para_type: ParaType,
        pcw: Pcw,
        obj_hi5: u8,
        default_next: State,
        sink: &mut dyn InterruptSink,
    ) {
        match para_type {
            ParaType::EndOfList => {
                let list = self.list_type.take().unwrap_or_else(|| self.list_type_or_default(pcw));
                sink.raise(InterruptId::for_list(list));
                self.state = default_next;
                self.committed_len = self.buffer.len();
            }
            ParaType::PolygonOrModifierVolume => {
                let list = self.establish_list_type(pcw);
                let branch = if list.is_modifier_volume() {
                    State::ModVolV64
                } else {
                    State::PolyV32
                };
                match self.table.get(branch, para_type.to_bits(), obj_hi5) {
                    Some(real) => self.state = real.next,
                    None => warn!(
                        "malformed TA command word: {}",
                        TaError::InvalidColTypeVolumeCombination
                    ),
                }
            }
            ParaType::Sprite => {
                let list = self.establish_list_type(pcw);
                if list.is_modifier_volume() {
                    warn!("sprite header submitted to a modifier-volume list; ignoring list type");
                }
                match self.table.get(State::PolyV32, para_type.to_bits(), obj_hi5) {
                    Some(real) => self.state = real.next,
                    None => warn!(
                        "malformed TA command word: {}",
                        TaError::InvalidColTypeVolumeCombination
                    ),
                }
            }
            _ => self.state = default_next,
        }
    }

    fn establish_list_type(&mut self, pcw: Pcw) -> ListType {
        if self.list_type.is_none() {
            self.list_type = Some(self.list_type_or_default(pcw));
        }
        self.list_type.unwrap()
    }

    fn list_type_or_default(&self, pcw: Pcw) -> ListType {
        pcw.list_type().unwrap_or_else(|| {
            warn!(
                "reserved ListType bits {} in PCW; defaulting to Opaque",
                pcw.list_type_bits()
            );
            ListType::Opaque
        })
    }
}

impl Default for TaChannel {
    fn default() -> Self {
        TaChannel::new()
    }
}
