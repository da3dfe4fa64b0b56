// Core identifier and domain types for the draft protocol.
//
// These are lightweight types shared by `message.rs` (wire messages) and the
// coordinator/relay crates. `SessionId` is the routing key everything hangs
// off: the coordinator mints one per draft, viewers present it when joining,
// and the relay keys its snapshot and subscriber maps by it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one draft session. Serializes as the hyphenated
/// UUID string — the form players paste into an overlay viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Mint a fresh (random v4) session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque chat-platform identifier for a draft participant. Not meant for
/// display — `Participant::name` carries the human-readable handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// The two kinds of draft move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Ban,
    Pick,
}

/// Where a session stands, as published to overlays: the kind of move the
/// draft is currently waiting on, or `Complete` once the sequence exhausts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Ban,
    Pick,
    Complete,
}

impl From<ActionKind> for Phase {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Ban => Phase::Ban,
            ActionKind::Pick => Phase::Pick,
        }
    }
}
