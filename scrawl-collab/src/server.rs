//! TCP sketch server: accept loop and per-connection sessions.
//!
//! Each connection is served by its own task — the async rendition of
//! thread-per-connection, blocking only on its own socket reads. A
//! session moves through `CONNECTING → SYNCING → LIVE → CLOSED`:
//!
//! - SYNCING: atomically snapshot-and-subscribe via [`SketchHub::join`],
//!   then write the `ADD_ID` dump.
//! - LIVE: race inbound lines against the broadcast receiver. Inbound
//!   lines are parsed and applied through the hub; malformed ones are
//!   logged and dropped. Broadcast lines are forwarded verbatim.
//! - CLOSED: EOF or I/O failure ends the task; dropping the broadcast
//!   receiver deregisters the session from fan-out, and an in-flight
//!   broadcast to a dying session fails only that session's forward.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};

use crate::hub::SketchHub;
use crate::protocol::Command;
use crate::CollabError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: String,
    /// Broadcast buffer per session; a session this far behind starts
    /// dropping lines (and logs the lag).
    pub broadcast_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4242".to_string(),
            broadcast_capacity: 256,
        }
    }
}

/// Server statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub total_connections: u64,
    pub active_connections: u64,
    pub commands_applied: u64,
}

/// The sketch server.
///
/// A plain value, not a process-wide singleton: tests run several
/// independent servers in one process, each with its own hub.
pub struct SketchServer {
    config: ServerConfig,
    hub: Arc<SketchHub>,
    stats: Arc<RwLock<ServerStats>>,
}

impl SketchServer {
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(SketchHub::new(config.broadcast_capacity));
        Self {
            config,
            hub,
            stats: Arc::new(RwLock::new(ServerStats::default())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }

    /// The authoritative document state shared by all sessions.
    pub fn hub(&self) -> &Arc<SketchHub> {
        &self.hub
    }

    pub fn bind_addr(&self) -> &str {
        &self.config.bind_addr
    }

    pub async fn stats(&self) -> ServerStats {
        let mut stats = *self.stats.read().await;
        stats.commands_applied = self.hub.stats().commands_applied;
        stats
    }

    /// Bind and accept connections indefinitely.
    ///
    /// A failed accept is logged and the loop continues; only the
    /// initial bind error is fatal.
    pub async fn run(&self) -> Result<(), CollabError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        log::info!("sketch server listening on {}", self.config.bind_addr);

        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::error!("accept failed: {e}; continuing");
                    continue;
                }
            };

            let hub = Arc::clone(&self.hub);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                {
                    let mut s = stats.write().await;
                    s.total_connections += 1;
                    s.active_connections += 1;
                }
                log::info!("session {addr}: connected");

                if let Err(e) = handle_connection(stream, &hub).await {
                    log::warn!("session {addr}: closed with error: {e}");
                } else {
                    log::info!("session {addr}: closed");
                }

                stats.write().await.active_connections -= 1;
            });
        }
    }
}

/// Serve one client for the lifetime of its connection.
async fn handle_connection(stream: TcpStream, hub: &SketchHub) -> Result<(), CollabError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // SYNCING: dump current state before any broadcast can reach this
    // session. join() subscribes under the hub lock, so edits racing the
    // dump land in `rx`, never in both.
    let (dump, mut rx) = hub.join().await;
    for line in &dump {
        send_line(&mut write_half, line).await?;
    }
    log::debug!("session synced: {} shapes", dump.len());

    // LIVE
    loop {
        tokio::select! {
            inbound = lines.next_line() => {
                let line = match inbound {
                    Ok(Some(line)) => line,
                    // EOF: peer hung up.
                    Ok(None) => return Ok(()),
                    Err(e) => return Err(e.into()),
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(cmd) => {
                        log::debug!("received: {line}");
                        hub.apply(cmd).await;
                    }
                    // Malformed input never kills the connection.
                    Err(e) => log::warn!("discarding malformed command `{line}`: {e}"),
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Ok(line) => send_line(&mut write_half, &line).await?,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        log::warn!("session lagged, {n} broadcasts dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}

async fn send_line(write_half: &mut OwnedWriteHalf, line: &str) -> Result<(), CollabError> {
    write_half.write_all(line.as_bytes()).await?;
    write_half.write_all(b"\n").await?;
    Ok(())
}
