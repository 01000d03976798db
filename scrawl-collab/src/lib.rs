//! # scrawl-collab — Real-time sketch replication for Scrawl
//!
//! Keeps any number of editors converged on one shared drawing through a
//! central server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   TCP, line protocol   ┌──────────────┐
//! │ SketchClient │ ◄────────────────────► │ SketchServer │
//! │ (per editor) │                        │  (central)   │
//! └──────┬───────┘                        └──────┬───────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌──────────────┐                        ┌──────────────┐
//! │ Sketch       │                        │ SketchHub    │
//! │ (mirror)     │                        │ (authority + │
//! └──────────────┘                        │  fan-out)    │
//!                                         └──────┬───────┘
//!                                      ┌─────────┼─────────┐
//!                                      ▼         ▼         ▼
//!                                  Client A  Client B  Client C
//! ```
//!
//! Edits flow one way: an editor encodes a command and sends it upstream,
//! the server applies it to the authoritative sketch and rebroadcasts the
//! accepted line to every connection — including the originator, whose
//! mirror updates only on that echo. The server is thereby the single
//! linearization point for the shared history; every mirror replays the
//! same lines in the same order and converges.
//!
//! ## Modules
//!
//! - [`protocol`] — the newline-delimited command grammar shared by both
//!   sides
//! - [`hub`] — authoritative sketch plus ordered fan-out
//! - [`server`] — accept loop and per-connection sessions
//! - [`client`] — the editor-side replica link
//!
//! Reference: Kleppmann, Chapter 5 — Replication (single-leader).

pub mod client;
pub mod hub;
pub mod protocol;
pub mod server;

pub use client::{ConnectionState, SketchClient, SketchEvent};
pub use hub::{HubStats, SketchHub};
pub use protocol::{Command, ProtocolError};
pub use server::{ServerConfig, ServerStats, SketchServer};

/// Errors surfaced by the replication layer.
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol: {0}")]
    Protocol(#[from] protocol::ProtocolError),
    #[error("connection closed")]
    ConnectionClosed,
}
