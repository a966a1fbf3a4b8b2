//! # Sculpting
//!
//! Terrain edits are recorded as [`SculptEdit`] values and queued per chunk. A chunk's
//! queue is drained and applied by the worker that remeshes it, while it holds that
//! chunk's write lock, so edits to one chunk land in the order they were submitted and
//! never interleave with meshing.

use std::collections::{HashMap, VecDeque};

use cgmath::Point3;

use crate::core::MtResource;

use super::chunk::Chunk;

/// Whether an edit removes or adds terrain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SculptKind {
    /// Raise density, carving terrain away.
    Mine,
    /// Lower density, adding terrain.
    Build,
}

/// One brush stroke against the terrain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SculptEdit {
    pub kind: SculptKind,
    /// Brush center in world space.
    pub location: Point3<f32>,
    /// Frame time the stroke covers, in seconds.
    pub dt: f32,
    pub weight: f32,
    pub radius: f32,
}

impl SculptEdit {
    /// Applies this edit to `chunk`.
    ///
    /// # Returns
    /// `true` if any sample changed
    pub fn apply(&self, chunk: &mut Chunk) -> bool {
        match self.kind {
            SculptKind::Mine => chunk.mine(self.location, self.dt, self.weight, self.radius),
            SculptKind::Build => chunk.build(self.location, self.dt, self.weight, self.radius),
        }
    }
}

/// Pending edits, kept in submission order per chunk.
///
/// Clones share the same queues.
#[derive(Clone)]
pub struct EditQueues {
    queues: MtResource<HashMap<Point3<i32>, VecDeque<SculptEdit>>>,
}

impl EditQueues {
    pub fn new() -> Self {
        Self {
            queues: MtResource::new(HashMap::new()),
        }
    }

    /// Appends `edit` to the queue of the chunk at `position`.
    pub fn push(&self, position: Point3<i32>, edit: SculptEdit) {
        self.queues
            .get_mut()
            .entry(position)
            .or_default()
            .push_back(edit);
    }

    /// Removes and returns every edit queued for `position`, oldest first.
    pub fn drain(&self, position: Point3<i32>) -> Vec<SculptEdit> {
        self.queues
            .get_mut()
            .remove(&position)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Drops the queue for `position`, e.g. when its chunk is evicted.
    pub fn discard(&self, position: Point3<i32>) -> usize {
        self.queues
            .get_mut()
            .remove(&position)
            .map_or(0, |queue| queue.len())
    }

    /// Number of edits waiting for `position`.
    pub fn pending(&self, position: Point3<i32>) -> usize {
        self.queues.get().get(&position).map_or(0, VecDeque::len)
    }
}

impl Default for EditQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(kind: SculptKind, x: f32) -> SculptEdit {
        SculptEdit {
            kind,
            location: Point3::new(x, 0.0, 0.0),
            dt: 0.1,
            weight: 1.0,
            radius: 1.0,
        }
    }

    #[test]
    fn drain_returns_edits_in_submission_order() {
        let queues = EditQueues::new();
        let position = Point3::new(0, 0, 0);
        queues.push(position, edit(SculptKind::Mine, 1.0));
        queues.push(position, edit(SculptKind::Build, 2.0));
        queues.push(Point3::new(1, 0, 0), edit(SculptKind::Mine, 3.0));
        queues.push(position, edit(SculptKind::Mine, 4.0));

        let drained: Vec<f32> = queues.drain(position).iter().map(|e| e.location.x).collect();
        assert_eq!(drained, vec![1.0, 2.0, 4.0]);
        assert!(queues.drain(position).is_empty());
        assert_eq!(queues.pending(Point3::new(1, 0, 0)), 1);
    }

    #[test]
    fn discard_drops_the_queue() {
        let queues = EditQueues::new();
        let position = Point3::new(2, 0, 0);
        queues.push(position, edit(SculptKind::Mine, 0.0));
        queues.push(position, edit(SculptKind::Mine, 0.0));
        assert_eq!(queues.discard(position), 2);
        assert_eq!(queues.pending(position), 0);
    }
}
