// The fixed turn order every draft follows.

use surfdraft_protocol::types::ActionKind;

/// One step of the draft: which seat acts, what they must do, and the label
/// shown to participants and overlays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnDescriptor {
    /// Index into the session's participant pair: 0 is the starter.
    pub seat: usize,
    pub kind: ActionKind,
    pub label: &'static str,
}

/// The alternating ban/pick order, shared by every session. Read-only once
/// built.
#[derive(Clone, Debug)]
pub struct TurnSequence {
    turns: Vec<TurnDescriptor>,
}

impl TurnSequence {
    pub fn new(turns: Vec<TurnDescriptor>) -> Self {
        Self { turns }
    }

    /// Number of turns in the sequence.
    #[expect(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u32 {
        self.turns.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The descriptor for a given turn index, or `None` once the sequence is
    /// exhausted. The `None` case is the "sequence complete" sentinel every
    /// validation path keys off.
    pub fn get(&self, index: u32) -> Option<TurnDescriptor> {
        self.turns.get(index as usize).copied()
    }
}

impl Default for TurnSequence {
    /// The reference six-step draft: two opening bans, the two picks, then
    /// two closing bans that force a tiebreak.
    fn default() -> Self {
        use ActionKind::{Ban, Pick};
        Self::new(vec![
            TurnDescriptor { seat: 0, kind: Ban, label: "First ban" },
            TurnDescriptor { seat: 1, kind: Ban, label: "Second ban" },
            TurnDescriptor { seat: 0, kind: Pick, label: "First pick" },
            TurnDescriptor { seat: 1, kind: Pick, label: "Second pick" },
            TurnDescriptor { seat: 0, kind: Ban, label: "Third ban" },
            TurnDescriptor { seat: 1, kind: Ban, label: "Fourth ban" },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sequence_alternates_seats() {
        let sequence = TurnSequence::default();
        assert_eq!(sequence.len(), 6);
        for index in 0..sequence.len() {
            let turn = sequence.get(index).unwrap();
            assert_eq!(turn.seat, index as usize % 2);
        }
        assert!(sequence.get(6).is_none());
    }

    #[test]
    fn default_sequence_is_ban_ban_pick_pick_ban_ban() {
        use ActionKind::{Ban, Pick};
        let sequence = TurnSequence::default();
        let kinds: Vec<ActionKind> =
            (0..sequence.len()).map(|i| sequence.get(i).unwrap().kind).collect();
        assert_eq!(kinds, [Ban, Ban, Pick, Pick, Ban, Ban]);
    }
}
