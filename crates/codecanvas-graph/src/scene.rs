use codecanvas_core::{DocumentRef, EdgeKind, NodeId, Rect, TextRange, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Smallest size a node can be resized to.
pub const MIN_NODE_SIZE: Vec2 = Vec2 { x: 160.0, y: 80.0 };

/// One editor placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: NodeId,
    pub document: DocumentRef,
    /// Symbol the node was opened for, when it shows one part of a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<TextRange>,
    pub rect: Rect,
    pub pinned: bool,
    /// Created while track-changes was off. Never recorded in history and
    /// never persisted.
    pub transient: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl CanvasEdge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

/// The node/edge graph. Readable by anyone, writable only through the
/// mutation pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, CanvasNode>,
    edges: BTreeSet<CanvasEdge>,
    /// Paint order, bottom to top.
    stack: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&CanvasNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in paint order.
    pub fn nodes(&self) -> impl Iterator<Item = &CanvasNode> {
        self.stack.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &CanvasEdge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, edge: &CanvasEdge) -> bool {
        self.edges.contains(edge)
    }

    pub fn edges_of(&self, id: NodeId) -> Vec<CanvasEdge> {
        self.edges.iter().filter(|e| e.touches(id)).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn z_index(&self, id: NodeId) -> Option<usize> {
        self.stack.iter().position(|n| *n == id)
    }

    /// Topmost node under a canvas-space point.
    pub fn node_at(&self, point: Vec2) -> Option<&CanvasNode> {
        self.stack
            .iter()
            .rev()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.rect.contains_point(point))
    }

    pub fn nodes_in(&self, area: &Rect) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| area.intersects(&node.rect))
            .map(|node| node.id)
            .collect()
    }

    /// Ids of every node that belongs in a saved layout.
    pub fn group_ids(&self) -> BTreeSet<u64> {
        self.nodes
            .values()
            .filter(|node| !node.transient)
            .map(|node| node.id.0)
            .collect()
    }

    /// Bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        let mut iter = self.nodes.values();
        let first = iter.next()?.rect;
        let (min, max) = iter.fold((first.min(), first.max()), |(min, max), node| {
            let (a, b) = (node.rect.min(), node.rect.max());
            (
                Vec2::new(min.x.min(a.x), min.y.min(a.y)),
                Vec2::new(max.x.max(b.x), max.y.max(b.y)),
            )
        });
        Some(Rect::from_corners(min, max))
    }

    pub(crate) fn insert_node(&mut self, node: CanvasNode, z: usize) {
        let z = z.min(self.stack.len());
        self.stack.insert(z, node.id);
        self.nodes.insert(node.id, node);
    }

    /// Removes the node and prunes every edge touching it.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<(CanvasNode, usize, Vec<CanvasEdge>)> {
        let node = self.nodes.remove(&id)?;
        let z = self.z_index(id).unwrap_or(self.stack.len());
        self.stack.retain(|n| *n != id);
        let pruned = self.edges_of(id);
        self.edges.retain(|e| !e.touches(id));
        Some((node, z, pruned))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut CanvasNode> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn insert_edge(&mut self, edge: CanvasEdge) -> bool {
        if !self.contains(edge.from) || !self.contains(edge.to) {
            tracing::warn!("Edge {} -> {} references a missing node", edge.from, edge.to);
            return false;
        }
        self.edges.insert(edge)
    }

    pub(crate) fn remove_edge(&mut self, edge: &CanvasEdge) -> bool {
        self.edges.remove(edge)
    }

    pub(crate) fn raise(&mut self, id: NodeId) {
        if let Some(z) = self.z_index(id) {
            let id = self.stack.remove(z);
            self.stack.push(id);
        }
    }
}
