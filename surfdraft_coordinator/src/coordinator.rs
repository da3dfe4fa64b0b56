// The draft coordinator: session store, prompts, and relay publishing.
//
// Owns the active `DraftSession` (the store is keyed by id, but at most one
// entry lives in it at a time), applies submissions through the session
// state machine, and mirrors every accepted mutation to the overlay relay:
// a transient `map_action` per move, a `session_update` snapshot after it,
// and the tiebreak announcement plus terminal snapshot when the sequence
// completes. Rejections publish nothing.

use std::collections::BTreeMap;

use surfdraft_protocol::message::{MapActionEvent, Participant, RecordedAction};
use surfdraft_protocol::types::{ActionKind, ActorId, SessionId};
use surfdraft_relay::server::OverlayPublisher;
use tracing::info;

use crate::error::{DraftError, command};
use crate::pool::MapPool;
use crate::sequence::{TurnDescriptor, TurnSequence};
use crate::session::DraftSession;

/// Label broadcast with the auto-picked tie-breaker map.
pub const TIEBREAK_ACTOR: &str = "Tie Breaker";

/// What `start` hands back to the command surface.
#[derive(Clone, Debug)]
pub struct StartReceipt {
    /// The routing key viewers use to subscribe.
    pub session_id: SessionId,
    /// Prompt naming the first expected actor and command.
    pub prompt: Option<String>,
}

/// What an accepted submission hands back.
#[derive(Clone, Debug)]
pub struct ActionReceipt {
    pub action: RecordedAction,
    /// Prompt for the next turn; `None` once the draft is complete.
    pub next_prompt: Option<String>,
    /// Present exactly when this submission completed the sequence.
    pub summary: Option<DraftSummary>,
}

/// Terminal report for a finished draft.
#[derive(Clone, Debug)]
pub struct DraftSummary {
    pub session_id: SessionId,
    /// The auto-picked map. Absent when the sequence ended in a pick, or
    /// when a custom pool had nothing left to pick from.
    pub tiebreak: Option<String>,
}

/// Read-only status of the active draft.
#[derive(Clone, Debug)]
pub struct DraftStatus {
    pub session_id: SessionId,
    pub participants: [String; 2],
    /// 1-based, so a fresh draft reads "Turn: 1/6".
    pub turn_number: u32,
    pub turn_total: u32,
    /// "{label} - {name} should use {command}" while a turn is pending.
    pub current_turn: String,
    pub actions_completed: usize,
}

pub struct DraftCoordinator {
    sessions: BTreeMap<SessionId, DraftSession>,
    pool: MapPool,
    sequence: TurnSequence,
    publisher: OverlayPublisher,
}

impl DraftCoordinator {
    /// Coordinator with the reference pool and turn sequence.
    pub fn new(publisher: OverlayPublisher) -> Self {
        Self::with_rules(MapPool::default(), TurnSequence::default(), publisher)
    }

    /// Coordinator with custom rules. Pool order sets tiebreak priority.
    pub fn with_rules(pool: MapPool, sequence: TurnSequence, publisher: OverlayPublisher) -> Self {
        Self { sessions: BTreeMap::new(), pool, sequence, publisher }
    }

    /// The pool submissions are validated against.
    pub fn pool(&self) -> &MapPool {
        &self.pool
    }

    /// Open a draft between two participants, in seat order. Publishes the
    /// initial snapshot so viewers can subscribe right away.
    ///
    /// One draft at a time: the store is keyed by id so the cap is a checked
    /// precondition here, not a structural limit.
    pub fn start(
        &mut self,
        starter: Participant,
        opponent: Participant,
    ) -> Result<StartReceipt, DraftError> {
        if !self.sessions.is_empty() {
            return Err(DraftError::SessionAlreadyActive);
        }
        let session = DraftSession::new(SessionId::new(), [starter, opponent]);
        let session_id = session.id();
        let prompt = turn_prompt(&self.sequence, &session);

        self.publisher.set_state(session_id, session.snapshot(&self.sequence));
        info!(session = %session_id, "draft started");
        self.sessions.insert(session_id, session);
        Ok(StartReceipt { session_id, prompt })
    }

    /// Validate and record one ban or pick.
    ///
    /// On success the move goes out as a transient `map_action` and the
    /// refreshed snapshot follows it. The submission that takes the final
    /// turn additionally broadcasts the tiebreak under `TIEBREAK_ACTOR`,
    /// publishes the terminal snapshot, and destroys the session — the
    /// process is free for a new draft as soon as this returns.
    pub fn submit_action(
        &mut self,
        actor: &ActorId,
        kind: ActionKind,
        map: &str,
    ) -> Result<ActionReceipt, DraftError> {
        let Some((&session_id, session)) = self.sessions.iter_mut().next() else {
            return Err(DraftError::NoActiveSession);
        };
        let action = session.apply(actor, kind, map, &self.pool, &self.sequence)?;
        info!(session = %session_id, map = %action.map, kind = ?action.kind, "action accepted");

        self.publisher.push_event(
            session_id,
            MapActionEvent {
                map_name: action.map.clone(),
                action: action.kind,
                actor_label: action.actor_label.clone(),
            },
        );

        if session.is_complete(&self.sequence) {
            let tiebreak = session.tiebreak().map(String::from);
            if let Some(winner) = &tiebreak {
                self.publisher.push_event(
                    session_id,
                    MapActionEvent {
                        map_name: winner.clone(),
                        action: ActionKind::Pick,
                        actor_label: TIEBREAK_ACTOR.to_string(),
                    },
                );
            }
            self.publisher.set_state(session_id, session.snapshot(&self.sequence));
            self.sessions.remove(&session_id);
            info!(session = %session_id, tiebreak = ?tiebreak, "draft complete, session closed");
            return Ok(ActionReceipt {
                action,
                next_prompt: None,
                summary: Some(DraftSummary { session_id, tiebreak }),
            });
        }

        self.publisher.set_state(session_id, session.snapshot(&self.sequence));
        let next_prompt = turn_prompt(&self.sequence, session);
        Ok(ActionReceipt { action, next_prompt, summary: None })
    }

    /// Descriptor of the turn the active draft is waiting on, or `None`
    /// when its sequence is already exhausted.
    pub fn current_turn(&self) -> Result<Option<TurnDescriptor>, DraftError> {
        let session = self.active_session()?;
        Ok(self.sequence.get(session.turn_index()))
    }

    /// Status summary of the active draft.
    pub fn describe(&self) -> Result<DraftStatus, DraftError> {
        let session = self.active_session()?;
        let participants = session.participants();
        let current_turn = match self.sequence.get(session.turn_index()) {
            Some(turn) => format!(
                "{} - {} should use {}",
                turn.label,
                participants[turn.seat].name,
                command(&turn.kind),
            ),
            None => "Session complete".to_string(),
        };
        Ok(DraftStatus {
            session_id: session.id(),
            participants: [participants[0].name.clone(), participants[1].name.clone()],
            turn_number: session.turn_index() + 1,
            turn_total: self.sequence.len(),
            current_turn,
            actions_completed: session.actions().len(),
        })
    }

    fn active_session(&self) -> Result<&DraftSession, DraftError> {
        self.sessions.values().next().ok_or(DraftError::NoActiveSession)
    }
}

/// The next-step prompt: "{label}: {name}, use {command} map".
fn turn_prompt(sequence: &TurnSequence, session: &DraftSession) -> Option<String> {
    let turn = sequence.get(session.turn_index())?;
    let name = &session.participants()[turn.seat].name;
    Some(format!("{}: {}, use {} map", turn.label, name, command(&turn.kind)))
}
