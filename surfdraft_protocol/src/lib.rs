// surfdraft_protocol — wire protocol shared by the draft coordinator and the
// overlay relay.
//
// This crate defines the message types, framing, and serialization used by
// the relay (`surfdraft_relay`) and overlay viewers to communicate over TCP,
// plus the session-snapshot types the coordinator publishes. It sits at the
// bottom of the workspace and depends on nothing above it.
//
// Module overview:
// - `types.rs`:    Core domain types: `SessionId`, `ActorId`, `ActionKind`,
//                  `Phase`.
// - `message.rs`:  Viewer-to-relay and relay-to-viewer message enums, plus
//                  the snapshot payload (`SessionState`) and its pieces.
// - `framing.rs`:  Length-delimited framing over any `Read`/`Write` stream:
//                  4-byte big-endian length prefix, then JSON payload.
//
// Design decisions:
// - **JSON with a `"type"` tag.** Overlay viewers are browser-grade clients;
//   a self-describing tagged encoding keeps them implementable in anything
//   that speaks JSON. Unknown tags fail decode instead of being guessed at.
// - **Snapshots carry display names.** Participants and actions embed the
//   human-readable handle next to the opaque actor id, so a viewer never
//   needs a side channel to render the draft board.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{
    MapActionEvent, OverlayMessage, Participant, RecordedAction, SessionState, ViewerMessage,
};
pub use types::{ActionKind, ActorId, Phase, SessionId};
