//! # Common types
//! Points, node handles, tree change notifications and solution records shared
//! by the tree store and the RRT variants.
use crate::error::Result;
use generational_arena::Index;
use nalgebra::Vector2;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::sync::mpsc::Sender;

/// A position in the 2D workspace
pub type Point = Vector2<f64>;

/// Handle to a record in the tree arena. The arena generation guards against
/// using a handle whose slot has been freed and reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Index);

impl NodeId {
    /// Arena slot of the record
    pub fn index(&self) -> usize {
        self.0.into_raw_parts().0
    }
}

/// Entry of the spatial index, pairing a point with the node that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    pub id: NodeId,
    pub point: [f64; 2],
}

impl IndexedPoint {
    pub fn new(id: NodeId, point: &Point) -> Self {
        Self {
            id,
            point: [point[0], point[1]],
        }
    }
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let x = self.point[0] - point[0];
        let y = self.point[1] - point[1];
        x * x + y * y
    }
}

/// Structural change of the tree, as seen by an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    EdgeAdded {
        parent: NodeId,
        child: NodeId,
        from: Point,
        to: Point,
    },
    EdgeRemoved {
        parent: NodeId,
        child: NodeId,
    },
    Rewired {
        child: NodeId,
        old_parent: NodeId,
        new_parent: NodeId,
    },
    PointPruned {
        id: NodeId,
        point: Point,
    },
    RootChanged {
        root: NodeId,
        point: Point,
    },
}

/// Receives tree change notifications, e.g. to keep a drawing in sync with the tree.
pub trait TreeObserver {
    fn notify(&mut self, event: &TreeEvent);
}

impl<F> TreeObserver for F
where
    F: FnMut(&TreeEvent),
{
    fn notify(&mut self, event: &TreeEvent) {
        self(event)
    }
}

/// Events sent after the receiver is gone are discarded
impl TreeObserver for Sender<TreeEvent> {
    fn notify(&mut self, event: &TreeEvent) {
        let _ = self.send(event.clone());
    }
}

/// Lowest cost path from the root to the goal region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub waypoints: Vec<[f64; 2]>,
    pub cost: f64,
}

impl Solution {
    pub fn new(path: &[Point], cost: f64) -> Self {
        Self {
            waypoints: path.iter().map(|p| [p[0], p[1]]).collect(),
            cost,
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.waypoints
            .iter()
            .map(|wp| Vector2::new(wp[0], wp[1]))
            .collect()
    }

    pub fn save_to_json(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(&File::create(filename)?, &self)?;
        Ok(())
    }

    pub fn load_from_json(filename: &str) -> Result<Self> {
        let solution = serde_json::from_reader(File::open(filename)?)?;
        Ok(solution)
    }
}
