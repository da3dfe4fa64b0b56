// TCP server and main event loop for the overlay relay.
//
// Architecture: one listener thread accepts connections, one reader thread
// per viewer parses inbound frames, and a single main loop owns the
// `SubscriberRegistry`. Everything funnels through one `mpsc` channel —
// connection lifecycle events from the socket side, publications from
// `OverlayPublisher` handles on the coordinator side — so the registry
// itself never needs a lock.

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use surfdraft_protocol::framing::read_message;
use surfdraft_protocol::message::{MapActionEvent, SessionState, ViewerMessage};
use surfdraft_protocol::types::SessionId;
use tracing::{debug, info, warn};

use crate::registry::{ConnectionId, SubscriberRegistry};

/// Everything the main loop reacts to, in arrival order.
enum RelayEvent {
    NewConnection { conn_id: ConnectionId, stream: TcpStream },
    MessageFrom { conn_id: ConnectionId, message: ViewerMessage },
    Disconnected { conn_id: ConnectionId },
    SetState { session_id: SessionId, state: SessionState },
    PushEvent { session_id: SessionId, event: MapActionEvent },
}

/// Configuration for starting a relay server.
pub struct RelayConfig {
    /// Port to listen on; 0 lets the OS pick.
    pub port: u16,
    /// Bound on a single subscriber write. A viewer that stalls longer is
    /// evicted rather than retried.
    pub write_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { port: 8080, write_timeout: Duration::from_secs(5) }
    }
}

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    tx: Sender<RelayEvent>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Mint a publisher feeding this relay. Cheap to clone and to call from
    /// any thread.
    pub fn publisher(&self) -> OverlayPublisher {
        OverlayPublisher { tx: self.tx.clone() }
    }

    /// Signal the relay to stop and wait for the main loop to exit.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Publisher half of the relay: the in-process handle the draft coordinator
/// mirrors state through.
///
/// Both calls are fire-and-forget channel sends. The main loop performs the
/// actual fan-out, so a publisher never blocks on subscriber sockets and
/// never observes delivery failures. Sends after the relay has stopped are
/// silently dropped.
#[derive(Clone)]
pub struct OverlayPublisher {
    tx: Sender<RelayEvent>,
}

impl OverlayPublisher {
    /// Replace the retained snapshot for a session and fan it out.
    pub fn set_state(&self, session_id: SessionId, state: SessionState) {
        let _ = self.tx.send(RelayEvent::SetState { session_id, state });
    }

    /// Fan out a transient event without touching the retained snapshot.
    pub fn push_event(&self, session_id: SessionId, event: MapActionEvent) {
        let _ = self.tx.send(RelayEvent::PushEvent { session_id, event });
    }
}

/// Start the relay on a background thread. Returns the control handle and
/// the actual bound address.
pub fn start_relay(config: RelayConfig) -> std::io::Result<(RelayHandle, SocketAddr)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let (tx, rx) = mpsc::channel();

    let keep_running_main = keep_running.clone();
    let tx_main = tx.clone();
    let thread = thread::spawn(move || {
        run_relay(listener, config.write_timeout, rx, tx_main, keep_running_main);
    });

    info!(%addr, "overlay relay listening");
    Ok((RelayHandle { keep_running, tx, thread: Some(thread) }, addr))
}

/// Main relay loop. Runs until `keep_running` is cleared.
fn run_relay(
    listener: TcpListener,
    write_timeout: Duration,
    rx: Receiver<RelayEvent>,
    tx: Sender<RelayEvent>,
    keep_running: Arc<AtomicBool>,
) {
    let mut registry = SubscriberRegistry::new();

    // Non-blocking accepts so the listener thread can notice shutdown.
    listener.set_nonblocking(true).ok();

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        let mut next_conn_id: u64 = 0;
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    stream.set_write_timeout(Some(write_timeout)).ok();
                    let conn_id = ConnectionId(next_conn_id);
                    next_conn_id += 1;
                    let _ = tx_listener.send(RelayEvent::NewConnection { conn_id, stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // The timeout exists only to re-check keep_running; all fan-out is
    // event-driven, there is no broadcast cadence.
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                handle_event(&mut registry, event, &tx, &keep_running);
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut registry, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("overlay relay stopped");
}

/// Apply one event to the registry.
fn handle_event(
    registry: &mut SubscriberRegistry,
    event: RelayEvent,
    tx: &Sender<RelayEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        RelayEvent::NewConnection { conn_id, stream } => {
            handle_new_connection(registry, conn_id, stream, tx, keep_running);
        }
        RelayEvent::MessageFrom { conn_id, message } => match message {
            ViewerMessage::JoinSession { session_id } => registry.join(conn_id, session_id),
        },
        RelayEvent::Disconnected { conn_id } => registry.disconnect(conn_id),
        RelayEvent::SetState { session_id, state } => registry.set_state(session_id, state),
        RelayEvent::PushEvent { session_id, event } => registry.push_event(session_id, event),
    }
}

/// Track a new viewer connection and spawn its reader thread. There is no
/// handshake; a viewer is silent until it asks to join a session.
fn handle_new_connection(
    registry: &mut SubscriberRegistry,
    conn_id: ConnectionId,
    stream: TcpStream,
    tx: &Sender<RelayEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!(conn = conn_id.0, error = %e, "could not clone viewer stream");
            return;
        }
    };
    registry.connect(conn_id, stream);

    let tx_reader = tx.clone();
    let keep_running_reader = keep_running.clone();
    thread::spawn(move || {
        reader_loop(BufReader::new(reader_stream), conn_id, tx_reader, keep_running_reader);
    });
    debug!(conn = conn_id.0, "viewer connected");
}

/// Reader loop for a single viewer, running in its own thread.
///
/// A framing-level failure (bad length prefix, EOF) ends the connection. A
/// well-framed payload that fails to decode is the viewer's bug, not a
/// transport fault: log it, drop the message, keep reading.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    conn_id: ConnectionId,
    tx: Sender<RelayEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_message(&mut reader) {
            Ok(bytes) => match serde_json::from_slice::<ViewerMessage>(&bytes) {
                Ok(message) => {
                    let _ = tx.send(RelayEvent::MessageFrom { conn_id, message });
                }
                Err(e) => {
                    warn!(conn = conn_id.0, error = %e, "ignoring malformed viewer message");
                }
            },
            Err(_) => {
                let _ = tx.send(RelayEvent::Disconnected { conn_id });
                break;
            }
        }
    }
}
