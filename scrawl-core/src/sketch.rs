//! The sketch: an ordered map from stable identifiers to shapes.
//!
//! The server owns the authoritative sketch; every editor owns a mirror
//! that it mutates only in response to server broadcasts. Identifiers are
//! allocated by a per-sketch monotonic counter — never reused within a
//! run, so a stale reference to a deleted shape can only miss, never
//! alias a newer shape.

use std::collections::BTreeMap;

use crate::shape::{Color, Shape};

/// A shared drawing: identifier → shape, in insertion (= paint) order.
///
/// `Sketch` itself is not synchronized. The replication layer wraps the
/// authoritative instance and each mirror in a single lock whose critical
/// section covers both snapshot-for-sync and mutate-then-broadcast; see
/// `scrawl-collab`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    shapes: BTreeMap<u32, Shape>,
    next_id: u32,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a shape under a freshly allocated identifier.
    ///
    /// Only the authoritative sketch allocates; mirrors call this too,
    /// but only while replaying server broadcasts, which arrive in the
    /// same order the server applied them and therefore derive the same
    /// identifiers.
    pub fn add(&mut self, shape: Shape) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        log::trace!("sketch: {} added as id {id}", shape.kind());
        self.shapes.insert(id, shape);
        id
    }

    /// Insert a shape under an explicit identifier (initial-sync replay).
    ///
    /// Bumps the allocation counter past `id` so identifiers derived for
    /// subsequent broadcasts line up with the server's.
    pub fn add_with_id(&mut self, id: u32, shape: Shape) {
        self.next_id = self.next_id.max(id + 1);
        self.shapes.insert(id, shape);
    }

    /// Shift the shape `id` by `(dx, dy)`. Unknown ids are a no-op:
    /// concurrent deletion races make stale references routine.
    pub fn translate(&mut self, id: u32, dx: i32, dy: i32) -> bool {
        match self.shapes.get_mut(&id) {
            Some(shape) => {
                shape.translate(dx, dy);
                true
            }
            None => false,
        }
    }

    /// Recolor the shape `id`. Unknown ids are a no-op.
    pub fn recolor(&mut self, id: u32, color: Color) -> bool {
        match self.shapes.get_mut(&id) {
            Some(shape) => {
                shape.set_color(color);
                true
            }
            None => false,
        }
    }

    /// Remove the shape `id`. Unknown ids are a no-op. The identifier is
    /// never reissued.
    pub fn remove(&mut self, id: u32) -> bool {
        self.shapes.remove(&id).is_some()
    }

    /// The topmost shape containing `(x, y)`.
    ///
    /// Later-added shapes paint over earlier ones, so the scan runs from
    /// the highest identifier down and the first hit wins.
    pub fn shape_at(&self, x: i32, y: i32) -> Option<u32> {
        self.shapes
            .iter()
            .rev()
            .find(|(_, shape)| shape.contains(x, y))
            .map(|(id, _)| *id)
    }

    pub fn get(&self, id: u32) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Shapes in ascending identifier order — the paint order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Shape)> {
        self.shapes.iter().map(|(id, shape)| (*id, shape))
    }

    /// An owned `(id, shape)` snapshot in paint order, for handing to a
    /// renderer or a syncing peer without holding any lock.
    pub fn snapshot(&self) -> Vec<(u32, Shape)> {
        self.shapes
            .iter()
            .map(|(id, shape)| (*id, shape.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The identifier the next [`Sketch::add`] will allocate.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}
