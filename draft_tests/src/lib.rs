// Test-only overlay viewer for draft integration tests.
//
// Wraps the real `OverlayViewer` (from `surfdraft_relay::viewer`) with
// blocking poll helpers for exercising the full pipeline:
// start → coordinator → relay → fan-out → viewer.
//
// The only test-specific code here is the synchronous polling wrappers
// (blocking loops around `OverlayViewer::poll()`). The networking uses the
// same code paths as a production overlay connection.
//
// See also: `tests/full_pipeline.rs` for the end-to-end scenarios.

use std::thread;
use std::time::{Duration, Instant};

use surfdraft_protocol::message::{MapActionEvent, OverlayMessage, SessionState};
use surfdraft_protocol::types::{Phase, SessionId};
use surfdraft_relay::viewer::OverlayViewer;

/// Default timeout for blocking poll operations.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A test overlay viewer wrapping a real `OverlayViewer`.
///
/// Everything the connection delivers lands in `received`, in arrival
/// order; the wait helpers consume it through an internal cursor, so two
/// waits in a row see consecutive messages even when both arrived in one
/// batch.
pub struct TestViewer {
    viewer: OverlayViewer,
    /// Full message log for the life of the connection.
    pub received: Vec<OverlayMessage>,
    cursor: usize,
}

impl TestViewer {
    /// Connect to a relay and subscribe to a session.
    pub fn connect(addr: &str, session_id: SessionId) -> Self {
        let viewer = OverlayViewer::connect(addr, session_id).expect("TestViewer::connect failed");
        Self { viewer, received: Vec::new(), cursor: 0 }
    }

    /// Re-subscribe this connection to a different session.
    pub fn join(&mut self, session_id: SessionId) {
        self.viewer.join(session_id).expect("TestViewer::join failed");
    }

    /// Drain everything currently queued into `received` and mark it
    /// consumed.
    pub fn drain(&mut self) {
        self.received.extend(self.viewer.poll());
        self.cursor = self.received.len();
    }

    /// Blocking poll until a snapshot with `turn_index >= turn` arrives.
    pub fn wait_for_turn(&mut self, turn: u32) -> SessionState {
        self.wait_until(&format!("turn {turn} snapshot"), |msg| match msg {
            OverlayMessage::SessionUpdate { data } if data.turn_index >= turn => Some(data.clone()),
            _ => None,
        })
    }

    /// Blocking poll until a transient `map_action` naming `map` arrives.
    pub fn wait_for_event(&mut self, map: &str) -> MapActionEvent {
        self.wait_until(&format!("map_action for {map}"), |msg| match msg {
            OverlayMessage::MapAction(event) if event.map_name == map => Some(event.clone()),
            _ => None,
        })
    }

    /// Blocking poll until the terminal snapshot arrives.
    pub fn wait_for_completion(&mut self) -> SessionState {
        self.wait_until("completion snapshot", |msg| match msg {
            OverlayMessage::SessionUpdate { data } if data.phase == Phase::Complete => {
                Some(data.clone())
            }
            _ => None,
        })
    }

    /// Assert that nothing unconsumed is pending and nothing new arrives
    /// within `window`.
    pub fn assert_silent(&mut self, window: Duration) {
        if let Some(msg) = self.viewer.recv_timeout(window) {
            self.received.push(msg);
        }
        if self.cursor < self.received.len() {
            panic!("expected silence, got {:?}", &self.received[self.cursor..]);
        }
    }

    /// Advance through the log until `pick` matches, polling for fresh
    /// messages as needed. Consumed messages stay in `received`.
    fn wait_until<T>(
        &mut self,
        what: &str,
        mut pick: impl FnMut(&OverlayMessage) -> Option<T>,
    ) -> T {
        let start = Instant::now();
        loop {
            self.received.extend(self.viewer.poll());
            while self.cursor < self.received.len() {
                let msg = &self.received[self.cursor];
                self.cursor += 1;
                if let Some(value) = pick(msg) {
                    return value;
                }
            }
            assert!(start.elapsed() < POLL_TIMEOUT, "timed out waiting for {what}");
            thread::sleep(POLL_INTERVAL);
        }
    }
}
