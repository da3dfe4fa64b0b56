// Failure kinds for draft operations.
//
// Every variant is recoverable and surfaced to the actor who caused it; the
// Display text is the exact line the command surface replies with. None of
// these terminate the process or the session.

use surfdraft_protocol::types::ActionKind;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    /// Only one draft may run per process.
    #[error("A session is already running!")]
    SessionAlreadyActive,

    #[error("No session running. Use /startmap.")]
    NoActiveSession,

    /// The submitted map is not in the pool.
    #[error("Invalid map name.")]
    UnknownMap,

    /// Every turn has already been taken.
    #[error("All turns have been completed!")]
    SequenceComplete,

    /// Another participant is up. Names who and for what.
    #[error("It's {name}'s turn for {label}.")]
    WrongTurn { name: String, label: &'static str },

    /// Right participant, wrong command for this turn's action kind.
    #[error(
        "It's time for {label}. Use {} instead of {}.",
        command(.expected),
        counterpart(.expected)
    )]
    WrongActionForPhase { label: &'static str, expected: ActionKind },
}

/// The slash command that performs an action kind.
pub(crate) fn command(kind: &ActionKind) -> &'static str {
    match kind {
        ActionKind::Ban => "/banmap",
        ActionKind::Pick => "/pickmap",
    }
}

/// The other command, for telling a participant which one they misused.
pub(crate) fn counterpart(kind: &ActionKind) -> &'static str {
    match kind {
        ActionKind::Ban => "/pickmap",
        ActionKind::Pick => "/banmap",
    }
}
