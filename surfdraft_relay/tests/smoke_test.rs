// Integration smoke test for the overlay relay.
//
// Starts a relay on localhost and exercises the viewer-facing protocol over
// real sockets: subscribe, late-joiner catch-up, transient events,
// malformed-payload tolerance, re-subscription, and shutdown. Publishing
// goes through `OverlayPublisher` exactly the way the coordinator does it.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use surfdraft_protocol::framing::{read_message, write_message};
use surfdraft_protocol::message::{
    MapActionEvent, OverlayMessage, Participant, SessionState, ViewerMessage,
};
use surfdraft_protocol::types::{ActionKind, ActorId, Phase, SessionId};
use surfdraft_relay::server::{RelayConfig, start_relay};
use surfdraft_relay::viewer::OverlayViewer;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> RelayConfig {
    RelayConfig { port: 0, ..RelayConfig::default() }
}

fn snapshot(session_id: SessionId, turn_index: u32, phase: Phase) -> SessionState {
    SessionState {
        id: session_id,
        participants: [
            Participant { id: ActorId("1001".into()), name: "Alice".into() },
            Participant { id: ActorId("1002".into()), name: "Bob".into() },
        ],
        turn_index,
        actions: Vec::new(),
        phase,
        tiebreak: None,
    }
}

#[test]
fn subscribe_then_receive_updates() {
    let (handle, addr) = start_relay(test_config()).unwrap();
    let publisher = handle.publisher();
    let session_id = SessionId::new();

    let viewer = OverlayViewer::connect(&addr.to_string(), session_id).unwrap();

    // No snapshot exists yet, so joining is silent.
    thread::sleep(Duration::from_millis(100));
    assert!(viewer.poll().is_empty());

    publisher.set_state(session_id, snapshot(session_id, 0, Phase::Ban));
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::SessionUpdate { data }) => {
            assert_eq!(data.id, session_id);
            assert_eq!(data.turn_index, 0);
        }
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    publisher.push_event(
        session_id,
        MapActionEvent {
            map_name: "surf_nyx".into(),
            action: ActionKind::Ban,
            actor_label: "Alice".into(),
        },
    );
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::MapAction(event)) => {
            assert_eq!(event.map_name, "surf_nyx");
            assert_eq!(event.action, ActionKind::Ban);
            assert_eq!(event.actor_label, "Alice");
        }
        other => panic!("expected MapAction, got {other:?}"),
    }

    handle.stop();
}

#[test]
fn late_joiner_receives_latest_snapshot_only() {
    let (handle, addr) = start_relay(test_config()).unwrap();
    let publisher = handle.publisher();
    let session_id = SessionId::new();

    // Two snapshots published before anyone is watching.
    publisher.set_state(session_id, snapshot(session_id, 0, Phase::Ban));
    publisher.set_state(session_id, snapshot(session_id, 3, Phase::Pick));
    thread::sleep(Duration::from_millis(200));

    let viewer = OverlayViewer::connect(&addr.to_string(), session_id).unwrap();
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::SessionUpdate { data }) => {
            assert_eq!(data.turn_index, 3, "catch-up must carry the latest state");
            assert_eq!(data.phase, Phase::Pick);
        }
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    // Nothing else is replayed.
    assert!(viewer.recv_timeout(Duration::from_millis(200)).is_none());

    handle.stop();
}

#[test]
fn malformed_payload_leaves_connection_usable() {
    let (handle, addr) = start_relay(test_config()).unwrap();
    let publisher = handle.publisher();
    let session_id = SessionId::new();

    publisher.set_state(session_id, snapshot(session_id, 2, Phase::Pick));
    thread::sleep(Duration::from_millis(200));

    // Raw framed client so we can send broken payloads on purpose.
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(RECV_TIMEOUT)).unwrap();
    let reader_stream = stream.try_clone().unwrap();
    let mut writer = BufWriter::new(stream);
    let mut reader = BufReader::new(reader_stream);

    // Valid frame, garbage payload.
    write_message(&mut writer, b"not json at all").unwrap();
    // Valid JSON, unknown tag.
    write_message(&mut writer, br#"{"type":"set_state"}"#).unwrap();

    // The connection survived both: a real join still works.
    let join = serde_json::to_vec(&ViewerMessage::JoinSession { session_id }).unwrap();
    write_message(&mut writer, &join).unwrap();

    let bytes = read_message(&mut reader).unwrap();
    let msg: OverlayMessage = serde_json::from_slice(&bytes).unwrap();
    match msg {
        OverlayMessage::SessionUpdate { data } => assert_eq!(data.turn_index, 2),
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    handle.stop();
}

#[test]
fn rejoin_switches_sessions() {
    let (handle, addr) = start_relay(test_config()).unwrap();
    let publisher = handle.publisher();
    let session_a = SessionId::new();
    let session_b = SessionId::new();

    publisher.set_state(session_a, snapshot(session_a, 1, Phase::Ban));
    publisher.set_state(session_b, snapshot(session_b, 7, Phase::Pick));
    thread::sleep(Duration::from_millis(200));

    let mut viewer = OverlayViewer::connect(&addr.to_string(), session_a).unwrap();
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::SessionUpdate { data }) => assert_eq!(data.id, session_a),
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    viewer.join(session_b).unwrap();
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::SessionUpdate { data }) => {
            assert_eq!(data.id, session_b);
            assert_eq!(data.turn_index, 7);
        }
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    // Updates for the old session no longer arrive: publish to both and the
    // next message through is session B's.
    publisher.set_state(session_a, snapshot(session_a, 2, Phase::Ban));
    publisher.set_state(session_b, snapshot(session_b, 8, Phase::Pick));
    match viewer.recv_timeout(RECV_TIMEOUT) {
        Some(OverlayMessage::SessionUpdate { data }) => {
            assert_eq!(data.id, session_b);
            assert_eq!(data.turn_index, 8);
        }
        other => panic!("expected SessionUpdate, got {other:?}"),
    }

    handle.stop();
}

#[test]
fn publisher_outliving_relay_is_silent() {
    let (handle, _addr) = start_relay(test_config()).unwrap();
    let publisher = handle.publisher();
    let session_id = SessionId::new();

    handle.stop();

    // The receiving side is gone; these must be swallowed, not panic.
    publisher.set_state(session_id, snapshot(session_id, 0, Phase::Ban));
    publisher.push_event(
        session_id,
        MapActionEvent {
            map_name: "surf_nyx".into(),
            action: ActionKind::Ban,
            actor_label: "Alice".into(),
        },
    );
}
