// surfdraft_coordinator — the two-player map draft state machine.
//
// A draft is a bounded ritual: two participants alternate through a fixed
// ban/ban/pick/pick/ban/ban sequence over a shared map pool, and when the
// closing bans leave no picked winner, a tiebreak auto-selects the first
// pool map nobody referenced. This crate owns that logic end to end and
// mirrors every accepted move to the overlay relay; it knows nothing about
// the chat commands or browser pages on either side of it.
//
// Module overview:
// - `pool.rs`:        the ordered map pool; pool order is tiebreak priority.
// - `sequence.rs`:    the fixed turn order (`TurnDescriptor`, `TurnSequence`).
// - `session.rs`:     one draft's state machine — validation, turn
//                     advancement, tiebreak resolution, snapshots.
// - `coordinator.rs`: the session store (at most one active entry), prompt
//                     composition, and relay publishing.
// - `error.rs`:       `DraftError`, the six user-visible failure kinds with
//                     their reply texts.
//
// Design decisions:
// - The session store is keyed by id even though only one draft runs at a
//   time; the cardinality cap is a checked precondition in `start`, not a
//   structural assumption.
// - Rejected submissions mutate nothing and publish nothing, so a retry
//   after a rejection sees the exact same state.
// - The tiebreak is broadcast as a transient event and recorded in the
//   snapshot's `tiebreak` field; it is not appended to the action log.

pub mod coordinator;
pub mod error;
pub mod pool;
pub mod sequence;
pub mod session;

pub use coordinator::{
    ActionReceipt, DraftCoordinator, DraftStatus, DraftSummary, StartReceipt, TIEBREAK_ACTOR,
};
pub use error::DraftError;
pub use pool::{DEFAULT_MAPS, MapPool};
pub use sequence::{TurnDescriptor, TurnSequence};
pub use session::DraftSession;
