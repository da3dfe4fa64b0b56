// Wire messages between overlay viewers and the relay.
//
// Two enums define the protocol vocabulary:
// - `ViewerMessage`: sent by an overlay viewer to the relay (join only).
// - `OverlayMessage`: pushed by the relay to subscribed viewers.
//
// Both are tagged unions discriminated by a `"type"` field (`join_session`,
// `session_update`, `map_action`), keeping payloads self-describing for
// non-Rust overlay clients. Unknown or malformed payloads fail decode at the
// boundary; the relay logs and drops them rather than guessing at fields.
//
// `SessionState` is the full snapshot retained per session and replayed to
// late joiners. `MapActionEvent` is the transient per-move notification:
// fanned out to current subscribers, never retained.

use serde::{Deserialize, Serialize};

use crate::types::{ActionKind, ActorId, Phase, SessionId};

/// Messages sent by an overlay viewer to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    /// Subscribe to a session's broadcast stream.
    JoinSession { session_id: SessionId },
}

/// Messages pushed by the relay to subscribed overlay viewers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayMessage {
    /// Full session snapshot. Sent on every state change, and replayed on
    /// join when a snapshot is already retained.
    SessionUpdate { data: SessionState },
    /// A single ban/pick as it happens. Only currently-connected viewers
    /// see it.
    MapAction(MapActionEvent),
}

/// Public identity of a draft participant: the opaque platform id plus the
/// display handle overlays render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ActorId,
    pub name: String,
}

/// One accepted move in the draft log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedAction {
    pub actor: ActorId,
    pub actor_label: String,
    pub map: String,
    pub kind: ActionKind,
}

/// Full snapshot of one draft session, as retained by the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: SessionId,
    pub participants: [Participant; 2],
    pub turn_index: u32,
    pub actions: Vec<RecordedAction>,
    pub phase: Phase,
    /// Map auto-picked when the sequence closed on a ban. Present only in
    /// the final (`Phase::Complete`) snapshot, and only if the pool still
    /// had an unreferenced entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<String>,
}

/// The transient per-move notification as it crosses the relay: what the
/// publisher hands to `push_event`, and the payload of
/// `OverlayMessage::MapAction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapActionEvent {
    pub map_name: String,
    pub action: ActionKind,
    pub actor_label: String,
}
