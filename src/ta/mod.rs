//! The tile accelerator command processor: the streaming front-end that
//! turns 32-byte command words from guest software into per-list parameter
//! buffers.
//!
//! This is one half of the crate (see the [crate root](crate) docs); the
//! other half, [`crate::raster`], consumes the buffers this module
//! produces once a region entry points at them.
//!
//! # Design Notes
//!
//! The reference implementation keeps FSM state, the open list marker, and
//! the parameter buffer in process-wide globals and thread-locals, since it
//! only ever runs one TA context at a time. This module makes all of that
//! state an explicit, owned [`TaChannel`] instead, so an embedder hosting
//! multiple independent tile accelerators (or running tests in parallel)
//! never has to serialize around shared mutable state that the algorithm
//! itself doesn't actually need to share.

mod channel;
mod fsm;
mod interrupt;
mod lut;
mod pcw;

pub use channel::{TaChannel, WORD_LEN};
pub use fsm::{State, Transition, TransitionTable};
pub use interrupt::{InterruptId, InterruptSink, RecordingInterruptSink};
pub use lut::{poly_data_type_id, poly_header_type_size, HeaderSize, PolyType, TypeLut};
pub use pcw::{ListType, ObjCtrl, ParaType, Pcw};
