use crate::SceneError;
use crate::scene::{CanvasEdge, CanvasNode, SceneGraph};
use codecanvas_core::{NodeId, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A requested change to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneAction {
    AddNode { node: CanvasNode },
    RemoveNode { id: NodeId },
    MoveNode { id: NodeId, position: Vec2 },
    ResizeNode { id: NodeId, size: Vec2 },
    AddEdge { edge: CanvasEdge },
    RemoveEdge { edge: CanvasEdge },
    SetPinned { id: NodeId, pinned: bool },
}

impl SceneAction {
    pub fn name(&self) -> &'static str {
        match self {
            SceneAction::AddNode { .. } => "add-node",
            SceneAction::RemoveNode { .. } => "remove-node",
            SceneAction::MoveNode { .. } => "move-node",
            SceneAction::ResizeNode { .. } => "resize-node",
            SceneAction::AddEdge { .. } => "add-edge",
            SceneAction::RemoveEdge { .. } => "remove-edge",
            SceneAction::SetPinned { .. } => "set-pinned",
        }
    }

    /// Nodes the action refers to.
    pub fn subjects(&self) -> Vec<NodeId> {
        match self {
            SceneAction::AddNode { node } => vec![node.id],
            SceneAction::RemoveNode { id }
            | SceneAction::MoveNode { id, .. }
            | SceneAction::ResizeNode { id, .. }
            | SceneAction::SetPinned { id, .. } => vec![*id],
            SceneAction::AddEdge { edge } | SceneAction::RemoveEdge { edge } => {
                vec![edge.from, edge.to]
            }
        }
    }
}

/// Where a mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOrigin {
    User,
    /// Live feedback during a gesture, replaced by a user mutation on drop.
    Preview,
    /// Replayed by undo or redo.
    History,
    /// Rebuilt from a saved workspace.
    Restore,
}

/// An action on its way through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub action: SceneAction,
    pub origin: MutationOrigin,
    /// Whether the undo stage may record the resulting delta. Stages may only
    /// ever clear this.
    pub record: bool,
}

impl Mutation {
    pub fn new(action: SceneAction, origin: MutationOrigin) -> Self {
        Self {
            action,
            origin,
            record: matches!(origin, MutationOrigin::User),
        }
    }
}

/// The reversible effect of an applied action.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneDelta {
    NodeAdded {
        node: CanvasNode,
        z: usize,
        edges: Vec<CanvasEdge>,
    },
    NodeRemoved {
        node: CanvasNode,
        z: usize,
        edges: Vec<CanvasEdge>,
    },
    RectChanged {
        id: NodeId,
        before: Rect,
        after: Rect,
    },
    EdgeAdded(CanvasEdge),
    EdgeRemoved(CanvasEdge),
    PinnedChanged {
        id: NodeId,
        before: bool,
        after: bool,
    },
}

impl SceneDelta {
    pub fn inverse(&self) -> SceneDelta {
        match self.clone() {
            SceneDelta::NodeAdded { node, z, edges } => SceneDelta::NodeRemoved { node, z, edges },
            SceneDelta::NodeRemoved { node, z, edges } => SceneDelta::NodeAdded { node, z, edges },
            SceneDelta::RectChanged { id, before, after } => SceneDelta::RectChanged {
                id,
                before: after,
                after: before,
            },
            SceneDelta::EdgeAdded(edge) => SceneDelta::EdgeRemoved(edge),
            SceneDelta::EdgeRemoved(edge) => SceneDelta::EdgeAdded(edge),
            SceneDelta::PinnedChanged { id, before, after } => SceneDelta::PinnedChanged {
                id,
                before: after,
                after: before,
            },
        }
    }

    pub fn removed_node(&self) -> Option<NodeId> {
        match self {
            SceneDelta::NodeRemoved { node, .. } => Some(node.id),
            _ => None,
        }
    }

    pub fn added_node(&self) -> Option<NodeId> {
        match self {
            SceneDelta::NodeAdded { node, .. } => Some(node.id),
            _ => None,
        }
    }
}

impl SceneGraph {
    /// Computes what `action` would change, without touching the scene.
    pub(crate) fn delta_for(&self, action: &SceneAction) -> Result<SceneDelta, SceneError> {
        let require = |id: NodeId| self.node(id).ok_or(SceneError::UnknownNode(id));
        Ok(match action {
            SceneAction::AddNode { node } => {
                if self.contains(node.id) {
                    return Err(SceneError::DuplicateNode(node.id));
                }
                SceneDelta::NodeAdded {
                    node: node.clone(),
                    z: self.node_count(),
                    edges: Vec::new(),
                }
            }
            SceneAction::RemoveNode { id } => {
                let node = require(*id)?;
                SceneDelta::NodeRemoved {
                    node: node.clone(),
                    z: self.z_index(*id).unwrap_or(0),
                    edges: self.edges_of(*id),
                }
            }
            SceneAction::MoveNode { id, position } => {
                let before = require(*id)?.rect;
                SceneDelta::RectChanged {
                    id: *id,
                    before,
                    after: Rect {
                        position: *position,
                        size: before.size,
                    },
                }
            }
            SceneAction::ResizeNode { id, size } => {
                let before = require(*id)?.rect;
                SceneDelta::RectChanged {
                    id: *id,
                    before,
                    after: Rect {
                        position: before.position,
                        size: *size,
                    },
                }
            }
            SceneAction::AddEdge { edge } => {
                require(edge.from)?;
                require(edge.to)?;
                SceneDelta::EdgeAdded(*edge)
            }
            SceneAction::RemoveEdge { edge } => {
                if !self.has_edge(edge) {
                    return Err(SceneError::UnknownEdge(edge.from, edge.to));
                }
                SceneDelta::EdgeRemoved(*edge)
            }
            SceneAction::SetPinned { id, pinned } => SceneDelta::PinnedChanged {
                id: *id,
                before: require(*id)?.pinned,
                after: *pinned,
            },
        })
    }

    /// Applies a delta whole, or not at all.
    pub(crate) fn apply_delta(&mut self, delta: &SceneDelta) -> Result<(), SceneError> {
        match delta {
            SceneDelta::NodeAdded { node, z, edges } => {
                if self.contains(node.id) {
                    return Err(SceneError::DuplicateNode(node.id));
                }
                let dangling = edges.iter().find(|e| {
                    let other = if e.from == node.id { e.to } else { e.from };
                    other != node.id && !self.contains(other)
                });
                if let Some(edge) = dangling {
                    return Err(SceneError::UnknownEdge(edge.from, edge.to));
                }
                self.insert_node(node.clone(), *z);
                for edge in edges {
                    self.insert_edge(*edge);
                }
            }
            SceneDelta::NodeRemoved { node, .. } => {
                self.remove_node(node.id)
                    .ok_or(SceneError::UnknownNode(node.id))?;
            }
            SceneDelta::RectChanged { id, after, .. } => {
                let node = self.node_mut(*id).ok_or(SceneError::UnknownNode(*id))?;
                node.rect = *after;
            }
            SceneDelta::EdgeAdded(edge) => {
                if !self.contains(edge.from) || !self.contains(edge.to) {
                    return Err(SceneError::UnknownEdge(edge.from, edge.to));
                }
                self.insert_edge(*edge);
            }
            SceneDelta::EdgeRemoved(edge) => {
                if !self.remove_edge(edge) {
                    return Err(SceneError::UnknownEdge(edge.from, edge.to));
                }
            }
            SceneDelta::PinnedChanged { id, after, .. } => {
                let node = self.node_mut(*id).ok_or(SceneError::UnknownNode(*id))?;
                node.pinned = *after;
            }
        }
        Ok(())
    }
}
