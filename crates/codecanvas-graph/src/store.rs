use crate::SceneError;
use crate::action::{Mutation, MutationOrigin, SceneAction, SceneDelta};
use crate::camera::Camera;
use crate::focus::FocusHistory;
use crate::host::{CloseDecision, DocumentHost};
use crate::pipeline::{MutationPipeline, PipelineConfig, WorkspaceBaseline};
use crate::scene::{CanvasEdge, CanvasNode, SceneGraph};
use crate::spatial::TraversalDirection;
use codecanvas_core::{DocumentRef, EdgeKind, NodeId, Rect, TextRange, Vec2};
use codecanvas_events::{Event, EventBus};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The user cancelled at the save prompt; nothing changed.
    Cancelled,
}

/// Authoritative canvas state: the scene graph, the camera and the
/// selection. Every write goes through the mutation pipeline.
pub struct CanvasStore {
    scene: SceneGraph,
    camera: Camera,
    selection: BTreeSet<NodeId>,
    pipeline: MutationPipeline,
    host: Arc<dyn DocumentHost>,
    events: EventBus,
    next_id: u64,
}

impl CanvasStore {
    pub fn new(host: Arc<dyn DocumentHost>, events: EventBus, config: PipelineConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            camera: Camera::default(),
            selection: BTreeSet::new(),
            pipeline: MutationPipeline::new(config, events.clone()),
            host,
            events,
            next_id: 1,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn host(&self) -> &Arc<dyn DocumentHost> {
        &self.host
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn dispatch(
        &mut self,
        action: SceneAction,
        origin: MutationOrigin,
    ) -> Result<Option<SceneDelta>, SceneError> {
        self.pipeline
            .dispatch(&mut self.scene, Mutation::new(action, origin))
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Places a new node for `document`. Always succeeds; a non-finite
    /// position falls back to the camera position.
    pub fn add_node(&mut self, document: DocumentRef, position: Vec2, size: Vec2) -> NodeId {
        self.add_symbol_node(document, None, position, size)
    }

    /// Like [`Self::add_node`], for a node showing the symbol at `symbol`.
    pub fn add_symbol_node(
        &mut self,
        document: DocumentRef,
        symbol: Option<TextRange>,
        position: Vec2,
        size: Vec2,
    ) -> NodeId {
        let id = self.allocate_id();
        let position = if position.is_finite() {
            position
        } else {
            self.camera.position()
        };
        let path = document.path.clone();
        let node = CanvasNode {
            id,
            document,
            symbol,
            rect: Rect { position, size },
            pinned: false,
            transient: false,
        };
        match self.dispatch(SceneAction::AddNode { node }, MutationOrigin::User) {
            Ok(Some(_)) => self.events.publish(Event::NodeOpened { id, path }),
            Ok(None) => tracing::warn!("Node {} was not placed", id),
            Err(err) => tracing::warn!("Node {} was not placed: {}", id, err),
        }
        id
    }

    /// Re-creates a node from a saved layout under its saved id. Never
    /// recorded in history.
    pub fn restore_node(
        &mut self,
        id: NodeId,
        document: DocumentRef,
        symbol: Option<TextRange>,
        rect: Rect,
        pinned: bool,
    ) -> Result<NodeId, SceneError> {
        if self.scene.contains(id) {
            return Err(SceneError::DuplicateNode(id));
        }
        self.next_id = self.next_id.max(id.0 + 1);
        let path = document.path.clone();
        let node = CanvasNode {
            id,
            document,
            symbol,
            rect,
            pinned,
            transient: false,
        };
        self.dispatch(SceneAction::AddNode { node }, MutationOrigin::Restore)?
            .ok_or(SceneError::Vetoed("restore-node"))?;
        self.events.publish(Event::NodeOpened { id, path });
        Ok(id)
    }

    /// Removes a node and every edge touching it. A node whose document has
    /// unsaved changes first goes through the save prompt.
    pub async fn remove_node(&mut self, id: NodeId) -> Result<RemoveOutcome, SceneError> {
        let document = self
            .scene
            .node(id)
            .map(|node| node.document.clone())
            .ok_or(SceneError::UnknownNode(id))?;

        let host = Arc::clone(&self.host);
        if host.is_dirty(&document) {
            match host.confirm_close(&document).await {
                CloseDecision::Save => host.save_document(&document).await?,
                CloseDecision::Discard => {}
                CloseDecision::Cancel => {
                    self.events.publish(Event::NodeCloseCancelled { id });
                    return Ok(RemoveOutcome::Cancelled);
                }
            }
        }

        // The prompt may have taken a while; the node can be gone by now.
        if self.scene.contains(id) {
            self.dispatch(SceneAction::RemoveNode { id }, MutationOrigin::User)?;
            self.after_remove(id);
        }
        host.document_closed(&document);
        Ok(RemoveOutcome::Removed)
    }

    /// Closes every node in paint order. Stops at the first cancelled prompt
    /// and returns false, leaving the remaining nodes open.
    pub async fn close_all(&mut self) -> Result<bool, SceneError> {
        let ids: Vec<NodeId> = self.scene.nodes().map(|node| node.id).collect();
        for id in ids {
            if self.remove_node(id).await? == RemoveOutcome::Cancelled {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn after_remove(&mut self, id: NodeId) {
        if self.selection.remove(&id) {
            self.publish_selection();
        }
        self.events.publish(Event::NodeClosed { id });
    }

    pub fn move_node(&mut self, id: NodeId, position: Vec2) -> Result<(), SceneError> {
        self.require(id)?;
        self.dispatch(SceneAction::MoveNode { id, position }, MutationOrigin::User)?;
        Ok(())
    }

    /// Moves a node as live gesture feedback. Never recorded.
    pub fn preview_move(&mut self, id: NodeId, position: Vec2) -> Result<(), SceneError> {
        self.require(id)?;
        self.dispatch(SceneAction::MoveNode { id, position }, MutationOrigin::Preview)?;
        Ok(())
    }

    pub fn resize_node(&mut self, id: NodeId, size: Vec2) -> Result<(), SceneError> {
        self.require(id)?;
        self.dispatch(SceneAction::ResizeNode { id, size }, MutationOrigin::User)?;
        Ok(())
    }

    pub fn preview_resize(&mut self, id: NodeId, size: Vec2) -> Result<(), SceneError> {
        self.require(id)?;
        self.dispatch(SceneAction::ResizeNode { id, size }, MutationOrigin::Preview)?;
        Ok(())
    }

    pub fn set_pinned(&mut self, id: NodeId, pinned: bool) -> Result<(), SceneError> {
        self.require(id)?;
        self.dispatch(SceneAction::SetPinned { id, pinned }, MutationOrigin::User)?;
        Ok(())
    }

    fn require(&self, id: NodeId) -> Result<(), SceneError> {
        if self.scene.contains(id) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(id))
        }
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Connects two nodes. Returns false when the edge already existed or an
    /// endpoint is missing.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        let edge = CanvasEdge::new(from, to, kind);
        match self.dispatch(SceneAction::AddEdge { edge }, MutationOrigin::User) {
            Ok(Some(_)) => {
                self.events.publish(Event::EdgeAdded { from, to, kind });
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!("Edge {} -> {} not added: {}", from, to, err);
                false
            }
        }
    }

    /// Edge re-created from a saved layout. Never recorded.
    pub fn restore_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        let edge = CanvasEdge::new(from, to, kind);
        matches!(
            self.dispatch(SceneAction::AddEdge { edge }, MutationOrigin::Restore),
            Ok(Some(_))
        )
    }

    pub fn remove_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        let edge = CanvasEdge::new(from, to, kind);
        matches!(
            self.dispatch(SceneAction::RemoveEdge { edge }, MutationOrigin::User),
            Ok(Some(_))
        )
    }

    // ========================================================================
    // Camera
    // ========================================================================

    /// Stores a new camera. `scale` is clamped to the allowed zoom range.
    pub fn set_camera(&mut self, position: Vec2, scale: f64) {
        let before = self.camera;
        self.camera.set(position, scale);
        if self.camera != before {
            self.events.publish(Event::CameraChanged {
                position: self.camera.position(),
                scale: self.camera.scale(),
            });
        }
    }

    /// Zooms to `scale` keeping the canvas point under `anchor` (screen
    /// space) fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, scale: f64) {
        let (position, scale) = self.camera.zoomed_at(anchor, scale);
        self.set_camera(position, scale);
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.camera.set_viewport(size);
    }

    // ========================================================================
    // Selection and focus
    // ========================================================================

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn select(&mut self, id: NodeId, only_add: bool) {
        if !self.scene.contains(id) {
            return;
        }
        if !only_add {
            self.selection.clear();
        }
        self.selection.insert(id);
        self.publish_selection();
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.publish_selection();
        }
    }

    /// Selects the nodes intersecting `area` (canvas space).
    pub fn box_select(&mut self, area: Rect, only_add: bool) {
        let hits: BTreeSet<NodeId> = self.scene.nodes_in(&area).into_iter().collect();
        let next = if only_add {
            self.selection.union(&hits).copied().collect()
        } else {
            hits
        };
        if next != self.selection {
            self.selection = next;
            self.publish_selection();
        }
    }

    fn publish_selection(&mut self) {
        self.pipeline.spatial_mut().reset_cursor();
        self.events.publish(Event::SelectionChanged {
            ids: self.selection.iter().copied().collect(),
        });
    }

    pub fn focus(&mut self, id: NodeId) {
        if !self.scene.contains(id) {
            return;
        }
        self.scene.raise(id);
        self.pipeline.focus_mut().history_mut().push(id);
        self.events.publish(Event::FocusChanged { id: Some(id) });
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.pipeline.focus().history().current()
    }

    pub fn focus_history(&self) -> &FocusHistory {
        self.pipeline.focus().history()
    }

    pub fn focus_back(&mut self) -> Option<NodeId> {
        let id = self.pipeline.focus_mut().history_mut().back()?;
        self.scene.raise(id);
        self.events.publish(Event::FocusChanged { id: Some(id) });
        Some(id)
    }

    pub fn focus_forward(&mut self) -> Option<NodeId> {
        let id = self.pipeline.focus_mut().history_mut().forward()?;
        self.scene.raise(id);
        self.events.publish(Event::FocusChanged { id: Some(id) });
        Some(id)
    }

    // ========================================================================
    // Spatial traversal
    // ========================================================================

    /// Every node in reading order: rows top to bottom, left to right
    /// within a row.
    pub fn sorted_nodes(&mut self) -> Vec<NodeId> {
        self.pipeline.spatial_mut().sorted(&self.scene).to_vec()
    }

    /// The node after (or before) the current one in reading order,
    /// wrapping around. Does not change selection or focus.
    pub fn next_node(&mut self, direction: TraversalDirection) -> Option<NodeId> {
        self.pipeline
            .spatial_mut()
            .next(&self.scene, direction, &self.selection, &self.camera)
    }

    /// Steps to the next node in reading order, selects it alone and
    /// focuses it.
    pub fn focus_next(&mut self, direction: TraversalDirection) -> Option<NodeId> {
        let id = self.next_node(direction)?;
        self.select(id, false);
        self.focus(id);
        Some(id)
    }

    /// Node on viewport shortcut `slot`: 1 through 9 count the visible
    /// nodes in reading order and 0 is the tenth.
    pub fn nth_in_viewport(&mut self, slot: usize) -> Option<NodeId> {
        self.pipeline
            .spatial_mut()
            .nth_in_view(&self.scene, &self.camera, slot)
    }

    /// The shortcut slot `id` currently has, if it is in view.
    pub fn enumeration_in_viewport(&mut self, id: NodeId) -> Option<usize> {
        self.pipeline
            .spatial_mut()
            .slot_in_view(&self.scene, &self.camera, id)
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn commit(&mut self) -> bool {
        self.pipeline.commit()
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.pipeline.undo(&mut self.scene);
        self.prune_selection();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.pipeline.redo(&mut self.scene);
        self.prune_selection();
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.pipeline.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.pipeline.can_redo()
    }

    pub fn track_changes(&self) -> bool {
        self.pipeline.track_changes()
    }

    pub fn set_track_changes(&mut self, enabled: bool) {
        self.pipeline.set_track_changes(enabled);
    }

    /// Runs an action through the pipeline without recording it.
    pub fn dispatch_untracked(&mut self, action: SceneAction) -> Result<bool, SceneError> {
        Ok(self.dispatch(action, MutationOrigin::Preview)?.is_some())
    }

    pub fn reset_history(&mut self) {
        self.pipeline.reset_history();
    }

    fn prune_selection(&mut self) {
        let before = self.selection.len();
        let scene = &self.scene;
        self.selection.retain(|id| scene.contains(*id));
        if self.selection.len() != before {
            self.publish_selection();
        }
    }

    // ========================================================================
    // Workspace tracking
    // ========================================================================

    pub fn set_workspace_baseline(&mut self, baseline: Option<WorkspaceBaseline>) {
        let workspace = self.pipeline.workspace_mut();
        workspace.set_baseline(baseline);
        workspace.evaluate(&self.scene);
    }

    pub fn workspace_baseline(&self) -> Option<&WorkspaceBaseline> {
        self.pipeline.workspace().baseline()
    }

    pub fn is_workspace_dirty(&self) -> bool {
        self.pipeline.workspace().is_dirty()
    }
}

#[cfg(test)]
mod tests;
