//! The editor-side replica link.
//!
//! One long-lived TCP connection to the sketch server. Inbound lines —
//! first the `ADD_ID` sync dump, then live broadcasts — are decoded with
//! the shared grammar and applied to the local mirror; each applied
//! command raises a [`SketchEvent::Changed`] so the embedding UI can
//! repaint. Outbound edits are encoded and sent upstream only: the
//! mirror is never pre-applied, it changes solely when the server echoes
//! the accepted command back, so what the user sees is always the
//! server-confirmed order — even with other editors racing them.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, RwLock};

use scrawl_core::{Color, Shape, Sketch};

use crate::protocol::Command;
use crate::CollabError;

/// Replica link lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Live,
    Closed,
}

/// Notifications for the rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchEvent {
    /// The mirror changed; repaint.
    Changed,
    /// The server went away; no further edits will flow either way.
    Disconnected,
}

/// A connected sketch client.
///
/// The mirror is shared: the link's reader task writes it, the render
/// side reads it through [`SketchClient::sketch`]. Renderers should take
/// the read lock briefly — clone a [`Sketch::snapshot`] out rather than
/// painting under the lock.
pub struct SketchClient {
    sketch: Arc<RwLock<Sketch>>,
    state: Arc<RwLock<ConnectionState>>,
    outgoing_tx: mpsc::Sender<String>,
    event_rx: Option<mpsc::Receiver<SketchEvent>>,
}

impl SketchClient {
    /// Connect to the server and start the reader/writer tasks.
    ///
    /// The first lines received are the state dump; the mirror is primed
    /// before the caller ever sees a `Changed` event for live traffic.
    /// Failure to connect is returned to the caller, for whom it is
    /// fatal: there is no replica without a server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, CollabError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, mut write_half) = stream.into_split();

        let sketch = Arc::new(RwLock::new(Sketch::new()));
        let state = Arc::new(RwLock::new(ConnectionState::Connecting));
        let (event_tx, event_rx) = mpsc::channel(256);
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(256);

        // Writer task: forward encoded edit intents upstream.
        tokio::spawn(async move {
            while let Some(line) = outgoing_rx.recv().await {
                if write_half.write_all(line.as_bytes()).await.is_err()
                    || write_half.write_all(b"\n").await.is_err()
                {
                    break;
                }
            }
        });

        // Live before the reader starts, so an immediate server close
        // can only move the state forward to Closed.
        *state.write().await = ConnectionState::Live;

        // Reader task: replay every server line into the mirror.
        {
            let sketch = Arc::clone(&sketch);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let mut lines = BufReader::new(read_half).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match Command::parse(&line) {
                                Ok(cmd) => {
                                    cmd.apply(&mut *sketch.write().await);
                                    let _ = event_tx.send(SketchEvent::Changed).await;
                                }
                                Err(e) => {
                                    log::warn!("discarding malformed broadcast `{line}`: {e}");
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            log::warn!("replica link read failed: {e}");
                            break;
                        }
                    }
                }
                log::info!("server connection closed");
                *state.write().await = ConnectionState::Closed;
                let _ = event_tx.send(SketchEvent::Disconnected).await;
            });
        }

        Ok(Self {
            sketch,
            state,
            outgoing_tx,
            event_rx: Some(event_rx),
        })
    }

    /// The local mirror of the shared drawing.
    pub fn sketch(&self) -> Arc<RwLock<Sketch>> {
        Arc::clone(&self.sketch)
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Take the event receiver (can only be taken once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<SketchEvent>> {
        self.event_rx.take()
    }

    /// Ask the server to add a shape. The mirror picks the shape up when
    /// the accepted `ADD` is echoed back.
    pub async fn add_shape(&self, shape: Shape) -> Result<(), CollabError> {
        self.send(Command::Add(shape)).await
    }

    /// Ask the server to move shape `id` by a relative delta.
    pub async fn move_shape(&self, id: u32, dx: i32, dy: i32) -> Result<(), CollabError> {
        self.send(Command::Move { id, dx, dy }).await
    }

    /// Ask the server to recolor shape `id`.
    pub async fn recolor_shape(&self, id: u32, color: Color) -> Result<(), CollabError> {
        self.send(Command::Recolor { id, color }).await
    }

    /// Ask the server to delete shape `id`.
    pub async fn delete_shape(&self, id: u32) -> Result<(), CollabError> {
        self.send(Command::Delete { id }).await
    }

    /// The topmost shape of the mirror under `(x, y)` — the target an
    /// interactive move/recolor/delete should name.
    pub async fn shape_at(&self, x: i32, y: i32) -> Option<u32> {
        self.sketch.read().await.shape_at(x, y)
    }

    async fn send(&self, cmd: Command) -> Result<(), CollabError> {
        self.outgoing_tx
            .send(cmd.encode())
            .await
            .map_err(|_| CollabError::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_an_error() {
        // Nothing listens on this freshly bound-then-dropped port.
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = SketchClient::connect(("127.0.0.1", port)).await;
        assert!(matches!(result, Err(CollabError::Io(_))));
    }

    #[tokio::test]
    async fn test_take_event_rx_once() {
        // A bare listener is enough to accept the TCP connection.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _keep_open = listener.accept().await;
            std::future::pending::<()>().await;
        });

        let mut client = SketchClient::connect(addr).await.unwrap();
        assert!(client.take_event_rx().is_some());
        assert!(client.take_event_rx().is_none());
        assert_eq!(client.state().await, ConnectionState::Live);
        assert!(client.sketch().read().await.is_empty());
    }
}
