// Subscriber registry: who is watching which draft session, and what the
// last known state of each session is.
//
// The registry is single-threaded. The server's main loop owns it and feeds
// it connections, joins, and publications one at a time, so nothing in here
// locks. Each session has a "room" of subscribed viewer connections plus an
// optional retained snapshot; the snapshot is what a late joiner receives
// the moment it subscribes, before any live update can reach it.
//
// Writes to viewers are best-effort. A write that fails (or times out, via
// the write timeout the server sets at accept) evicts that one subscriber;
// the publisher is never told and the other subscribers are unaffected.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;

use surfdraft_protocol::framing::write_message;
use surfdraft_protocol::message::{MapActionEvent, OverlayMessage, SessionState};
use surfdraft_protocol::types::SessionId;
use tracing::debug;

/// Relay-assigned id for one viewer connection. Assigned by the listener
/// thread, never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Retained snapshots and per-session subscriber rooms.
pub struct SubscriberRegistry {
    /// Latest full state per session, kept for late-joiner catch-up.
    /// Outlives the subscribers: an empty room does not clear the snapshot.
    snapshots: BTreeMap<SessionId, SessionState>,
    /// Subscribed connections, grouped by session.
    rooms: BTreeMap<SessionId, BTreeMap<ConnectionId, BufWriter<TcpStream>>>,
    /// Connections that have not joined a session yet. They receive nothing.
    pending: BTreeMap<ConnectionId, BufWriter<TcpStream>>,
    /// Reverse index: which session each joined connection belongs to.
    joined: BTreeMap<ConnectionId, SessionId>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            rooms: BTreeMap::new(),
            pending: BTreeMap::new(),
            joined: BTreeMap::new(),
        }
    }

    /// Track a newly accepted viewer connection. It stays in the pending set
    /// until it asks to join a session.
    pub fn connect(&mut self, conn_id: ConnectionId, stream: TcpStream) {
        self.pending.insert(conn_id, BufWriter::new(stream));
    }

    /// Subscribe a connection to a session, moving it out of its previous
    /// room if it was already subscribed somewhere.
    ///
    /// Catch-up happens before the connection enters the room, so a viewer
    /// can never observe a live update ordered ahead of its first snapshot.
    /// If the catch-up write fails the connection is discarded outright.
    pub fn join(&mut self, conn_id: ConnectionId, session_id: SessionId) {
        let Some(mut writer) = self.detach(conn_id) else {
            return;
        };

        if let Some(state) = self.snapshots.get(&session_id) {
            let msg = OverlayMessage::SessionUpdate { data: state.clone() };
            if send_message(&mut writer, &msg).is_err() {
                debug!(conn = conn_id.0, session = %session_id, "dropping viewer: catch-up write failed");
                return;
            }
        }

        self.rooms.entry(session_id).or_default().insert(conn_id, writer);
        self.joined.insert(conn_id, session_id);
        debug!(conn = conn_id.0, session = %session_id, "viewer subscribed");
    }

    /// Forget a connection. Its room is pruned if it was the last subscriber;
    /// the session's snapshot is retained either way.
    pub fn disconnect(&mut self, conn_id: ConnectionId) {
        if self.pending.remove(&conn_id).is_some() {
            return;
        }
        let Some(session_id) = self.joined.remove(&conn_id) else {
            return;
        };
        if let Some(room) = self.rooms.get_mut(&session_id) {
            room.remove(&conn_id);
            if room.is_empty() {
                self.rooms.remove(&session_id);
            }
        }
        debug!(conn = conn_id.0, session = %session_id, "viewer disconnected");
    }

    /// Replace the retained snapshot for a session and fan it out to every
    /// current subscriber.
    pub fn set_state(&mut self, session_id: SessionId, state: SessionState) {
        let msg = OverlayMessage::SessionUpdate { data: state.clone() };
        self.snapshots.insert(session_id, state);
        self.broadcast(session_id, &msg);
    }

    /// Fan out a transient event. Not retained: a viewer joining afterwards
    /// will not see it.
    pub fn push_event(&mut self, session_id: SessionId, event: MapActionEvent) {
        let msg = OverlayMessage::MapAction(event);
        self.broadcast(session_id, &msg);
    }

    /// Number of live subscribers in a session's room.
    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.rooms.get(&session_id).map_or(0, |room| room.len())
    }

    /// Whether a snapshot is currently retained for a session.
    pub fn has_snapshot(&self, session_id: SessionId) -> bool {
        self.snapshots.contains_key(&session_id)
    }

    /// Send one message to every subscriber of a session. The subscriber ids
    /// are snapshotted before the first write so that evicting a dead
    /// connection mid-broadcast cannot disturb the iteration.
    fn broadcast(&mut self, session_id: SessionId, msg: &OverlayMessage) {
        let Some(room) = self.rooms.get(&session_id) else {
            return;
        };
        let ids: Vec<ConnectionId> = room.keys().copied().collect();
        for conn_id in ids {
            self.send_to(session_id, conn_id, msg);
        }
    }

    /// Send to a single subscriber, evicting it on write failure.
    fn send_to(&mut self, session_id: SessionId, conn_id: ConnectionId, msg: &OverlayMessage) {
        let Some(room) = self.rooms.get_mut(&session_id) else {
            return;
        };
        let Some(writer) = room.get_mut(&conn_id) else {
            return;
        };
        if send_message(writer, msg).is_err() {
            room.remove(&conn_id);
            let emptied = room.is_empty();
            self.joined.remove(&conn_id);
            if emptied {
                self.rooms.remove(&session_id);
            }
            debug!(conn = conn_id.0, session = %session_id, "dropping viewer: write failed");
        }
    }

    /// Pull a connection's writer out of wherever it currently lives: the
    /// pending set for a first join, or its old room for a re-join.
    fn detach(&mut self, conn_id: ConnectionId) -> Option<BufWriter<TcpStream>> {
        if let Some(writer) = self.pending.remove(&conn_id) {
            return Some(writer);
        }
        let previous = self.joined.remove(&conn_id)?;
        let room = self.rooms.get_mut(&previous)?;
        let writer = room.remove(&conn_id);
        if room.is_empty() {
            self.rooms.remove(&previous);
        }
        writer
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize an overlay message to JSON and write it with length-delimited
/// framing. The caller decides what a failure means for the subscriber.
fn send_message(
    writer: &mut BufWriter<TcpStream>,
    msg: &OverlayMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    use surfdraft_protocol::framing::read_message;
    use surfdraft_protocol::message::Participant;
    use surfdraft_protocol::types::{ActionKind, ActorId, Phase};

    use super::*;

    /// Build a connected localhost socket pair: (client side, server side).
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn recv_overlay_msg(reader: &mut BufReader<TcpStream>) -> OverlayMessage {
        let bytes = read_message(reader).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn snapshot(session_id: SessionId, turn_index: u32) -> SessionState {
        SessionState {
            id: session_id,
            participants: [
                Participant { id: ActorId("1001".into()), name: "Alice".into() },
                Participant { id: ActorId("1002".into()), name: "Bob".into() },
            ],
            turn_index,
            actions: Vec::new(),
            phase: Phase::Ban,
            tiebreak: None,
        }
    }

    #[test]
    fn join_before_any_state_is_silent() {
        let (client, server) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        registry.connect(ConnectionId(0), server);
        registry.join(ConnectionId(0), session_id);
        assert_eq!(registry.subscriber_count(session_id), 1);
        assert!(!registry.has_snapshot(session_id));

        client.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut reader = BufReader::new(client);
        assert!(read_message(&mut reader).is_err(), "no catch-up should have been sent");
    }

    #[test]
    fn join_after_set_state_receives_retained_snapshot() {
        let (client, server) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        // State published while nobody was watching.
        registry.set_state(session_id, snapshot(session_id, 3));

        registry.connect(ConnectionId(0), server);
        registry.join(ConnectionId(0), session_id);

        let mut reader = BufReader::new(client);
        match recv_overlay_msg(&mut reader) {
            OverlayMessage::SessionUpdate { data } => {
                assert_eq!(data.id, session_id);
                assert_eq!(data.turn_index, 3);
            }
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
    }

    #[test]
    fn set_state_fans_out_to_every_subscriber() {
        let (client_a, server_a) = tcp_pair();
        let (client_b, server_b) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        registry.connect(ConnectionId(0), server_a);
        registry.join(ConnectionId(0), session_id);
        registry.connect(ConnectionId(1), server_b);
        registry.join(ConnectionId(1), session_id);

        registry.set_state(session_id, snapshot(session_id, 4));

        for client in [client_a, client_b] {
            let mut reader = BufReader::new(client);
            match recv_overlay_msg(&mut reader) {
                OverlayMessage::SessionUpdate { data } => assert_eq!(data.turn_index, 4),
                other => panic!("expected SessionUpdate, got {other:?}"),
            }
        }
    }

    #[test]
    fn updates_stay_within_their_session() {
        let (client_a, server_a) = tcp_pair();
        let (client_b, server_b) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_a = SessionId::new();
        let session_b = SessionId::new();

        registry.connect(ConnectionId(0), server_a);
        registry.join(ConnectionId(0), session_a);
        registry.connect(ConnectionId(1), server_b);
        registry.join(ConnectionId(1), session_b);

        registry.set_state(session_a, snapshot(session_a, 1));

        let mut reader_a = BufReader::new(client_a);
        match recv_overlay_msg(&mut reader_a) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.id, session_a),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }

        client_b.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut reader_b = BufReader::new(client_b);
        assert!(read_message(&mut reader_b).is_err(), "other session must not hear the update");
    }

    #[test]
    fn push_event_fans_out_but_is_not_retained() {
        let (client_a, server_a) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        registry.connect(ConnectionId(0), server_a);
        registry.join(ConnectionId(0), session_id);
        registry.set_state(session_id, snapshot(session_id, 0));
        registry.push_event(
            session_id,
            MapActionEvent {
                map_name: "surf_nyx".into(),
                action: ActionKind::Ban,
                actor_label: "Alice".into(),
            },
        );

        let mut reader_a = BufReader::new(client_a);
        match recv_overlay_msg(&mut reader_a) {
            OverlayMessage::SessionUpdate { .. } => {}
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
        match recv_overlay_msg(&mut reader_a) {
            OverlayMessage::MapAction(event) => assert_eq!(event.map_name, "surf_nyx"),
            other => panic!("expected MapAction, got {other:?}"),
        }

        // A viewer joining now gets the snapshot only, not the past event.
        let (client_b, server_b) = tcp_pair();
        registry.connect(ConnectionId(1), server_b);
        registry.join(ConnectionId(1), session_id);

        client_b.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut reader_b = BufReader::new(client_b);
        match recv_overlay_msg(&mut reader_b) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.turn_index, 0),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
        assert!(read_message(&mut reader_b).is_err(), "events must not be replayed");
    }

    #[test]
    fn disconnect_prunes_room_but_keeps_snapshot() {
        let (_client, server) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        registry.set_state(session_id, snapshot(session_id, 2));
        registry.connect(ConnectionId(0), server);
        registry.join(ConnectionId(0), session_id);
        assert_eq!(registry.subscriber_count(session_id), 1);

        registry.disconnect(ConnectionId(0));
        assert_eq!(registry.subscriber_count(session_id), 0);
        assert!(registry.has_snapshot(session_id), "snapshot must outlive its subscribers");

        // A later viewer can still catch up.
        let (client, server) = tcp_pair();
        registry.connect(ConnectionId(1), server);
        registry.join(ConnectionId(1), session_id);
        let mut reader = BufReader::new(client);
        match recv_overlay_msg(&mut reader) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.turn_index, 2),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
    }

    #[test]
    fn rejoin_moves_connection_between_sessions() {
        let (client, server) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_a = SessionId::new();
        let session_b = SessionId::new();

        registry.set_state(session_a, snapshot(session_a, 1));
        registry.set_state(session_b, snapshot(session_b, 5));

        registry.connect(ConnectionId(0), server);
        registry.join(ConnectionId(0), session_a);
        registry.join(ConnectionId(0), session_b);

        assert_eq!(registry.subscriber_count(session_a), 0);
        assert_eq!(registry.subscriber_count(session_b), 1);

        let mut reader = BufReader::new(client);
        match recv_overlay_msg(&mut reader) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.id, session_a),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
        match recv_overlay_msg(&mut reader) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.id, session_b),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }

        // Only the new session's updates arrive from here on.
        registry.set_state(session_a, snapshot(session_a, 2));
        registry.set_state(session_b, snapshot(session_b, 6));
        match recv_overlay_msg(&mut reader) {
            OverlayMessage::SessionUpdate { data } => {
                assert_eq!(data.id, session_b);
                assert_eq!(data.turn_index, 6);
            }
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
    }

    #[test]
    fn dead_subscriber_is_evicted_while_others_keep_receiving() {
        let (client_a, server_a) = tcp_pair();
        let (client_b, server_b) = tcp_pair();
        let mut registry = SubscriberRegistry::new();
        let session_id = SessionId::new();

        registry.connect(ConnectionId(0), server_a);
        registry.join(ConnectionId(0), session_id);
        registry.connect(ConnectionId(1), server_b);
        registry.join(ConnectionId(1), session_id);
        assert_eq!(registry.subscriber_count(session_id), 2);

        drop(client_b);

        // The broken pipe may take a write or two to surface; keep publishing
        // until the registry notices.
        let mut evicted = false;
        for turn in 0..20 {
            registry.set_state(session_id, snapshot(session_id, turn));
            if registry.subscriber_count(session_id) == 1 {
                evicted = true;
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(evicted, "dead subscriber was never evicted");

        // The healthy viewer received the updates published so far.
        let mut reader_a = BufReader::new(client_a);
        match recv_overlay_msg(&mut reader_a) {
            OverlayMessage::SessionUpdate { data } => assert_eq!(data.turn_index, 0),
            other => panic!("expected SessionUpdate, got {other:?}"),
        }
    }
}
