// One draft session: the turn-sequencing state machine.
//
// Pure state — no I/O, no channels. The coordinator owns instances, drives
// them through `apply`, and mirrors the results to the relay; this module
// only decides what is legal and what the session looks like afterwards.
//
// Invariant: `turn_index == actions.len()` between calls. `apply` either
// advances both together or changes nothing, so a rejected submission is
// indistinguishable from one that never happened.

use surfdraft_protocol::message::{Participant, RecordedAction, SessionState};
use surfdraft_protocol::types::{ActionKind, ActorId, Phase, SessionId};

use crate::error::DraftError;
use crate::pool::MapPool;
use crate::sequence::TurnSequence;

/// A single in-progress draft.
#[derive(Clone, Debug)]
pub struct DraftSession {
    id: SessionId,
    participants: [Participant; 2],
    turn_index: u32,
    actions: Vec<RecordedAction>,
    tiebreak: Option<String>,
}

impl DraftSession {
    pub fn new(id: SessionId, participants: [Participant; 2]) -> Self {
        Self { id, participants, turn_index: 0, actions: Vec::new(), tiebreak: None }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    pub fn turn_index(&self) -> u32 {
        self.turn_index
    }

    pub fn actions(&self) -> &[RecordedAction] {
        &self.actions
    }

    /// The auto-picked tie-breaker map, set at completion when the sequence
    /// did not end in a pick.
    pub fn tiebreak(&self) -> Option<&str> {
        self.tiebreak.as_deref()
    }

    pub fn is_complete(&self, sequence: &TurnSequence) -> bool {
        sequence.get(self.turn_index).is_none()
    }

    /// Validate and record one submission.
    ///
    /// The checks run in a fixed order so each failure mode stays a
    /// distinct, stable reply: unknown map, sequence already complete,
    /// wrong actor, wrong action kind. On success the action is appended,
    /// the turn advances, and — if that was the final turn of a sequence
    /// ending in bans — the tiebreak resolves to the first pool entry no
    /// action referenced.
    pub fn apply(
        &mut self,
        actor: &ActorId,
        kind: ActionKind,
        map: &str,
        pool: &MapPool,
        sequence: &TurnSequence,
    ) -> Result<RecordedAction, DraftError> {
        if !pool.contains(map) {
            return Err(DraftError::UnknownMap);
        }
        let Some(turn) = sequence.get(self.turn_index) else {
            return Err(DraftError::SequenceComplete);
        };
        let expected = &self.participants[turn.seat];
        if expected.id != *actor {
            return Err(DraftError::WrongTurn { name: expected.name.clone(), label: turn.label });
        }
        if turn.kind != kind {
            return Err(DraftError::WrongActionForPhase { label: turn.label, expected: turn.kind });
        }

        let action = RecordedAction {
            actor: actor.clone(),
            actor_label: expected.name.clone(),
            map: map.to_string(),
            kind,
        };
        self.actions.push(action.clone());
        self.turn_index += 1;

        if sequence.get(self.turn_index).is_none() {
            // A final pick names the winner outright; a sequence that ends
            // in bans leaves the choice to the tiebreak.
            let ends_in_pick = self.actions.last().is_some_and(|a| a.kind == ActionKind::Pick);
            if !ends_in_pick {
                let used: Vec<&str> = self.actions.iter().map(|a| a.map.as_str()).collect();
                self.tiebreak = pool.first_unreferenced(&used).map(String::from);
            }
        }
        Ok(action)
    }

    /// Full state for the overlay: everything a viewer needs to render the
    /// draft, including the phase derived from the current turn.
    pub fn snapshot(&self, sequence: &TurnSequence) -> SessionState {
        let phase = match sequence.get(self.turn_index) {
            Some(turn) => turn.kind.into(),
            None => Phase::Complete,
        };
        SessionState {
            id: self.id,
            participants: self.participants.clone(),
            turn_index: self.turn_index,
            actions: self.actions.clone(),
            phase,
            tiebreak: self.tiebreak.clone(),
        }
    }
}
