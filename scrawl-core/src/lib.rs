//! # scrawl-core — Shared drawing model for Scrawl
//!
//! The data model replicated between the sketch server and every editor:
//! geometric shapes with a packed-RGB color, and the [`Sketch`] container
//! that maps stable integer identifiers to shapes.
//!
//! This crate is deliberately I/O-free and runtime-free. Networking,
//! fan-out and the wire grammar live in `scrawl-collab`; rendering is the
//! embedding application's concern and only needs [`Sketch::iter`]
//! (ascending identifier order, which is the paint order) and
//! [`Shape::contains`] for hit testing.

pub mod shape;
pub mod sketch;

pub use shape::{Color, Point, Shape};
pub use sketch::Sketch;
