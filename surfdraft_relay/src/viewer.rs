// TCP client for subscribing to the overlay relay.
//
// The production overlay is a browser page; this is the Rust-side
// equivalent for tests and tooling. It mirrors the relay's own split:
// - `connect()` dials the relay and sends `join_session` on the calling
//   thread, then spawns a background reader thread.
// - The reader thread loops on `read_message()`, deserializes each
//   `OverlayMessage`, and pushes it into an `mpsc` inbox.
// - `poll()` drains the inbox non-blocking; `recv_timeout()` blocks for the
//   next message with a deadline.
//
// Dropping the viewer closes the socket; the relay notices through its
// reader thread and unregisters the subscription.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use surfdraft_protocol::framing::{read_message, write_message};
use surfdraft_protocol::message::{OverlayMessage, ViewerMessage};
use surfdraft_protocol::types::SessionId;

/// Blocking subscriber for one relay connection.
pub struct OverlayViewer {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<OverlayMessage>,
    _reader_thread: Option<JoinHandle<()>>,
}

impl OverlayViewer {
    /// Connect to a relay and subscribe to `session_id`. If the relay
    /// already retains a snapshot for that session, it arrives as the first
    /// message.
    pub fn connect(addr: &str, session_id: SessionId) -> Result<Self, String> {
        let stream = TcpStream::connect(addr).map_err(|e| format!("connect failed: {e}"))?;
        let reader_stream = stream.try_clone().map_err(|e| format!("clone failed: {e}"))?;
        let writer = BufWriter::new(stream);

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(BufReader::new(reader_stream), tx);
        });

        let mut viewer = Self { writer, inbox: rx, _reader_thread: Some(reader_thread) };
        viewer.join(session_id)?;
        Ok(viewer)
    }

    /// Subscribe to a session, replacing any previous subscription on this
    /// connection. Updates for the old session stop arriving.
    pub fn join(&mut self, session_id: SessionId) -> Result<(), String> {
        let msg = ViewerMessage::JoinSession { session_id };
        let json = serde_json::to_vec(&msg).map_err(|e| format!("encode failed: {e}"))?;
        write_message(&mut self.writer, &json).map_err(|e| format!("send join failed: {e}"))
    }

    /// Drain all queued overlay messages (non-blocking).
    pub fn poll(&self) -> Vec<OverlayMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Block up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<OverlayMessage> {
        self.inbox.recv_timeout(timeout).ok()
    }
}

/// Reader thread: framed messages in, channel out. Exits on any read or
/// decode failure, or once the viewer drops its inbox.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: Sender<OverlayMessage>) {
    while let Ok(bytes) = read_message(&mut reader) {
        match serde_json::from_slice::<OverlayMessage>(&bytes) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}
