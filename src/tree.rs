//! # Search tree
//! Arena backed tree of collision-free waypoints. Every record owns its point, its
//! parent handle and its ordered children, and all relations are handle lookups.
//! Next to the arena we keep an R*-tree of the live points for the nearest
//! neighbour queries, so both structures must be updated together on insert and
//! removal.
//!
//! Mutation is explicit: `insert` always attaches to a present parent, `detach`
//! and `rewire` only touch existing edges, and `remove` only accepts records that
//! have already been cut loose from their parent. Misuse is a programming error
//! and panics.
use crate::common::{IndexedPoint, NodeId, Point, TreeEvent, TreeObserver};
use crate::error::Result;
use crate::utils;
use generational_arena::Arena;
use rstar::RTree;
use serde::{Deserialize, Serialize};
use std::fs::File;

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub point: Point,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    fn new(point: Point, parent: Option<NodeId>) -> Self {
        Self {
            point,
            parent,
            children: Vec::new(),
        }
    }
}

pub struct SearchTree {
    arena: Arena<TreeNode>,
    root: Option<NodeId>,
    rtree: RTree<IndexedPoint>,
    observer: Option<Box<dyn TreeObserver>>,
}

impl SearchTree {
    pub fn new(root_point: Point) -> Self {
        let mut tree = Self {
            arena: Arena::new(),
            root: None,
            rtree: RTree::new(),
            observer: None,
        };
        let root_id = tree.alloc(TreeNode::new(root_point, None));
        tree.root = Some(root_id);
        tree
    }

    /// Install an observer that receives every structural change from now on
    pub fn set_observer(&mut self, observer: Box<dyn TreeObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) -> Option<Box<dyn TreeObserver>> {
        self.observer.take()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root.expect("Tree has no root")
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        self.arena
            .get(id.0)
            .unwrap_or_else(|| panic!("Node {:?} is not in the tree", id))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        self.arena
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("Node {:?} is not in the tree", id))
    }

    pub fn point(&self, id: NodeId) -> Point {
        self.node(id).point
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Live records in iteration order (arena slot order)
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> + '_ {
        self.arena.iter().map(|(index, node)| (NodeId(index), node))
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.iter().map(|(_, node)| node.point)
    }

    /// All parent -> child edges as point pairs
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.iter().filter_map(|(_, node)| {
            node.parent
                .map(|parent_id| (self.node(parent_id).point, node.point))
        })
    }

    fn alloc(&mut self, node: TreeNode) -> NodeId {
        let point = node.point;
        let id = NodeId(self.arena.insert(node));
        self.rtree.insert(IndexedPoint::new(id, &point));
        id
    }

    fn emit(&mut self, event: TreeEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.notify(&event);
        }
    }

    /// Inserts a new point into the tree as the last child of `parent`
    pub fn insert(&mut self, point: Point, parent: NodeId) -> NodeId {
        let parent_point = self.point(parent);
        let id = self.alloc(TreeNode::new(point, Some(parent)));
        self.node_mut(parent).children.push(id);
        self.emit(TreeEvent::EdgeAdded {
            parent,
            child: id,
            from: parent_point,
            to: point,
        });
        id
    }

    fn unlink_from_parent(&mut self, child: NodeId) -> NodeId {
        let parent = self
            .parent(child)
            .unwrap_or_else(|| panic!("Node {:?} has no parent to detach from", child));
        self.node_mut(parent).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
        parent
    }

    /// Removes the edge between `child` and its parent, in both directions
    pub fn detach(&mut self, child: NodeId) {
        let parent = self.unlink_from_parent(child);
        self.emit(TreeEvent::EdgeRemoved { parent, child });
    }

    /// Moves `child` (with its whole subtree) under `new_parent`
    pub fn rewire(&mut self, child: NodeId, new_parent: NodeId) {
        assert!(
            !self.is_ancestor(child, new_parent),
            "Rewiring {:?} under {:?} would create a cycle",
            child,
            new_parent
        );
        let old_parent = self.unlink_from_parent(child);
        self.node_mut(new_parent).children.push(child);
        self.node_mut(child).parent = Some(new_parent);
        self.emit(TreeEvent::Rewired {
            child,
            old_parent,
            new_parent,
        });
    }

    /// Deletes a record that no longer has a parent. Its children are cut loose
    /// and returned in order, so the caller decides what happens to them.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        assert!(
            self.parent(id).is_none(),
            "Node {:?} must be detached from its parent before removal",
            id
        );
        let node = self
            .arena
            .remove(id.0)
            .unwrap_or_else(|| panic!("Node {:?} is not in the tree", id));
        for &child in node.children.iter() {
            self.node_mut(child).parent = None;
            self.emit(TreeEvent::EdgeRemoved { parent: id, child });
        }

        self.rtree.remove(&IndexedPoint::new(id, &node.point));
        if self.root == Some(id) {
            self.root = None;
        }
        self.emit(TreeEvent::PointPruned {
            id,
            point: node.point,
        });
        node.children
    }

    /// Makes a parentless record the root. Only valid once the previous root is gone.
    pub fn set_root(&mut self, id: NodeId) {
        assert!(
            self.parent(id).is_none(),
            "New root {:?} still has a parent",
            id
        );
        assert!(
            self.root.is_none() || self.root == Some(id),
            "Tree already has root {:?}",
            self.root
        );
        self.root = Some(id);
        let point = self.point(id);
        self.emit(TreeEvent::RootChanged { root: id, point });
    }

    /// True if `ancestor` is `node` or lies on the parent chain of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Sum of edge lengths from `id` up to the root. Recomputed on every call.
    pub fn cost(&self, id: NodeId) -> f64 {
        let mut cost = 0.0;
        let mut node = self.node(id);
        while let Some(parent_id) = node.parent {
            let parent = self.node(parent_id);
            cost += utils::distance(&node.point, &parent.point);
            node = parent;
        }
        cost
    }

    /// Node handles from the root down to `id`
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent_id) = self.parent(current) {
            path.push(parent_id);
            current = parent_id;
        }
        path.reverse();
        path
    }

    /// The closest point to `query`; the lowest arena slot wins ties, which after
    /// a prune need not be the oldest point
    pub fn nearest(&self, query: &Point) -> NodeId {
        let mut candidates = self
            .rtree
            .nearest_neighbor_iter_with_distance_2(&[query[0], query[1]]);
        let (first, d2_min) = candidates.next().expect("Tree has no points");
        let mut best = first.id;
        for (candidate, d2) in candidates {
            if d2 > d2_min {
                break;
            }
            if candidate.id.index() < best.index() {
                best = candidate.id;
            }
        }
        best
    }

    /// Every point within `radius` (inclusive) of `query`, in iteration order
    pub fn within_distance(&self, query: &Point, radius: f64) -> Vec<NodeId> {
        let mut ids = self
            .rtree
            .nearest_neighbor_iter_with_distance_2(&[query[0], query[1]])
            .take_while(|(_, d2)| d2.sqrt() <= radius)
            .map(|(p, _)| p.id)
            .collect::<Vec<_>>();
        ids.sort_by_key(|id| id.index());
        ids
    }

    /// Checks the rooted tree invariants: a single root, consistent parent and
    /// children links, every parent chain ending at the root, and an index in
    /// sync with the arena.
    pub fn is_consistent(&self) -> bool {
        let root = match self.root {
            Some(root) if self.contains(root) => root,
            _ => return false,
        };
        if self.rtree.size() != self.arena.len() {
            return false;
        }
        for (id, node) in self.iter() {
            match node.parent {
                None if id != root => return false,
                Some(parent) => {
                    if !self.contains(parent) || !self.node(parent).children.contains(&id) {
                        return false;
                    }
                }
                None => {}
            }
            if node
                .children
                .iter()
                .any(|&c| !self.contains(c) || self.node(c).parent != Some(id))
            {
                return false;
            }
            // A chain longer than the number of records must contain a cycle
            let mut steps = 0;
            let mut current = id;
            while let Some(parent) = self.node(current).parent {
                steps += 1;
                if steps > self.arena.len() {
                    return false;
                }
                current = parent;
            }
            if current != root {
                return false;
            }
        }
        true
    }

    /// Pre-order export of the tree, numbering the nodes from the root
    pub fn snapshot(&self) -> TreeSnapshot {
        let mut nodes = Vec::with_capacity(self.arena.len());
        let mut stack: Vec<(NodeId, Option<usize>)> = vec![(self.root(), None)];
        while let Some((id, parent_id)) = stack.pop() {
            let node_id = nodes.len();
            let point = self.point(id);
            nodes.push(SnapshotNode {
                id: node_id,
                parent_id,
                point: [point[0], point[1]],
                cost: self.cost(id),
            });
            for &child in self.children(id).iter().rev() {
                stack.push((child, Some(node_id)));
            }
        }
        TreeSnapshot { nodes }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: usize,
    pub parent_id: Option<usize>,
    pub point: [f64; 2],
    pub cost: f64,
}

/// Read-only copy of the tree for renderers and offline inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<SnapshotNode>,
}

impl TreeSnapshot {
    pub fn save_to_json(&self, filename: &str) -> Result<()> {
        serde_json::to_writer_pretty(&File::create(filename)?, &self)?;
        Ok(())
    }
}
