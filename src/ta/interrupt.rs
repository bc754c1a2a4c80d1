//! The host interrupt sink the TA front-end raises list-end events on.
//!
//! The core never owns an interrupt controller; it only needs somewhere to
//! report "this list just ended" so the embedder can wake up whatever is
//! waiting on that event (a CPU interrupt line, a render-complete future).

use crate::ta::pcw::ListType;

/// Which of the five list-end interrupts fired.
///
/// Named after the reference hardware's interrupt bits rather than the
/// `ListType` they correspond to, since a host integrating this crate will
/// be wiring these onto its own interrupt controller by that name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptId {
    /// The opaque list ended.
    Opaque,
    /// The opaque modifier volume list ended.
    OpaqueMod,
    /// The translucent list ended.
    Trans,
    /// The translucent modifier volume list ended.
    TransMod,
    /// The punch-through list ended.
    PunchThru,
}

impl InterruptId {
    /// The interrupt raised when `list` ends.
    pub fn for_list(list: ListType) -> Self {
        match list {
            ListType::Opaque => InterruptId::Opaque,
            ListType::OpaqueModifierVolume => InterruptId::OpaqueMod,
            ListType::Translucent => InterruptId::Trans,
            ListType::TranslucentModifierVolume => InterruptId::TransMod,
            ListType::PunchThrough => InterruptId::PunchThru,
        }
    }
}

/// A sink the TA front-end reports list-end interrupts to.
///
/// Implemented by the embedder; [`crate::ta::TaChannel`] only ever calls
/// [`raise`](InterruptSink::raise), never reads it back.
pub trait InterruptSink {
    /// Called once per list-end transition, naming which list just closed.
    fn raise(&mut self, interrupt: InterruptId);
}

/// An [`InterruptSink`] that records every interrupt it receives, in order.
///
/// Used by tests and by embedders that want to batch interrupts rather than
/// react to each one synchronously.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingInterruptSink {
    /// Interrupts raised so far, oldest first.
    pub raised: Vec<InterruptId>,
}

impl InterruptSink for RecordingInterruptSink {
    fn raise(&mut self, interrupt: InterruptId) {
        self.raised.push(interrupt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_mapping_matches_list_order() {
        assert_eq!(InterruptId::for_list(ListType::Opaque), InterruptId::Opaque);
        assert_eq!(
            InterruptId::for_list(ListType::TranslucentModifierVolume),
            InterruptId::TransMod
        );
    }

    #[test]
    fn recording_sink_preserves_order() {
        let mut sink = RecordingInterruptSink::default();
        sink.raise(InterruptId::Opaque);
        sink.raise(InterruptId::PunchThru);
        assert_eq!(sink.raised, vec![InterruptId::Opaque, InterruptId::PunchThru]);
    }
}
