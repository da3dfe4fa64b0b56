// surfdraft_relay — broadcast relay mirroring draft sessions to overlays.
//
// The relay is a thin push broker between the draft coordinator and any
// number of read-only overlay viewers. It accepts TCP connections, lets
// each viewer subscribe to one session, and fans out every snapshot
// (`session_update`) and transient move (`map_action`) the coordinator
// publishes. It holds no draft logic of its own: whatever arrives on the
// publisher side is mirrored verbatim to whoever is watching, and a viewer
// joining mid-draft is caught up from the retained snapshot.
//
// Module overview:
// - `registry.rs`: the subscriber registry — per-session rooms, retained
//                  snapshots, late-joiner catch-up, best-effort fan-out.
//                  Single-threaded; the core data structure `server.rs`
//                  drives.
// - `server.rs`:   TCP listener, one reader thread per viewer, and the main
//                  event loop that owns the registry. Also home of
//                  `OverlayPublisher`, the in-process handle the
//                  coordinator publishes through.
// - `viewer.rs`:   blocking TCP subscriber (`OverlayViewer`) for tests and
//                  Rust-side tooling.
//
// Design decisions:
// - Plain std::net TCP with a thread per reader and a single mpsc channel
//   into the registry owner, so the registry never locks.
// - Publishing is fire-and-forget: a slow or dead viewer costs that viewer
//   its subscription, never the publisher a blocked call.
// - Snapshots outlive their subscribers; only explicit state replacement
//   changes what a late joiner sees.

pub mod registry;
pub mod server;
pub mod viewer;

pub use registry::{ConnectionId, SubscriberRegistry};
pub use server::{OverlayPublisher, RelayConfig, RelayHandle, start_relay};
pub use viewer::OverlayViewer;
