//! Interceptor chain every scene mutation passes through.
//!
//! Stages run in a fixed order: validation, track-changes gate, undo/redo,
//! workspace dirty tracking, focus history and finally the spatial sort
//! index. Before the mutation is applied
//! each stage may rewrite it or veto it; after it is applied each stage
//! observes the resulting delta. A vetoed mutation leaves the scene untouched.

use crate::action::{Mutation, MutationOrigin, SceneAction, SceneDelta};
use crate::focus::FocusHistory;
use crate::history::UndoHistory;
use crate::SceneError;
use crate::scene::{MIN_NODE_SIZE, SceneGraph};
use crate::spatial::SpatialSortStage;
use codecanvas_core::Vec2;
use codecanvas_events::{Event, EventBus};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A delta that has just been applied, as stages see it.
#[derive(Debug, Clone, Copy)]
pub struct Applied<'a> {
    pub origin: MutationOrigin,
    pub record: bool,
    pub delta: &'a SceneDelta,
}

pub trait MutationStage {
    fn name(&self) -> &'static str;

    /// Returns the mutation to pass on, or `None` to veto it.
    fn intercept(&mut self, mutation: Mutation, _scene: &SceneGraph) -> Option<Mutation> {
        Some(mutation)
    }

    fn observe(&mut self, _applied: &Applied<'_>, _scene: &SceneGraph) {}
}

// ============================================================================
// Validation
// ============================================================================

/// Vetoes mutations that would break the graph or change nothing, and clamps
/// node sizes.
#[derive(Debug, Default)]
pub struct ValidationStage;

impl MutationStage for ValidationStage {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn intercept(&mut self, mut mutation: Mutation, scene: &SceneGraph) -> Option<Mutation> {
        let valid = match &mut mutation.action {
            SceneAction::AddNode { node } => {
                node.rect.size = clamp_size(node.rect.size);
                !scene.contains(node.id) && node.rect.position.is_finite()
            }
            SceneAction::RemoveNode { id } => scene.contains(*id),
            SceneAction::MoveNode { id, position } => scene
                .node(*id)
                .is_some_and(|n| position.is_finite() && n.rect.position != *position),
            SceneAction::ResizeNode { id, size } => {
                *size = clamp_size(*size);
                scene.node(*id).is_some_and(|n| n.rect.size != *size)
            }
            SceneAction::AddEdge { edge } => {
                edge.from != edge.to
                    && scene.contains(edge.from)
                    && scene.contains(edge.to)
                    && !scene.has_edge(edge)
            }
            SceneAction::RemoveEdge { edge } => scene.has_edge(edge),
            SceneAction::SetPinned { id, pinned } => {
                scene.node(*id).is_some_and(|n| n.pinned != *pinned)
            }
        };
        valid.then_some(mutation)
    }
}

fn clamp_size(size: Vec2) -> Vec2 {
    let axis = |v: f64, min: f64| if v.is_finite() { v.max(min) } else { min };
    Vec2::new(axis(size.x, MIN_NODE_SIZE.x), axis(size.y, MIN_NODE_SIZE.y))
}

// ============================================================================
// Track-changes gate
// ============================================================================

/// Decides whether a mutation may be recorded at all. Nodes created while
/// tracking is off become transient, and anything touching a transient node
/// stays out of history.
#[derive(Debug)]
pub struct TrackChangesGate {
    enabled: bool,
}

impl Default for TrackChangesGate {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MutationStage for TrackChangesGate {
    fn name(&self) -> &'static str {
        "track-changes"
    }

    fn intercept(&mut self, mut mutation: Mutation, scene: &SceneGraph) -> Option<Mutation> {
        if !self.enabled {
            mutation.record = false;
            if let (SceneAction::AddNode { node }, MutationOrigin::User) =
                (&mut mutation.action, mutation.origin)
            {
                node.transient = true;
            }
        }
        let touches_transient = mutation
            .action
            .subjects()
            .into_iter()
            .any(|id| scene.node(id).is_some_and(|n| n.transient));
        if touches_transient {
            mutation.record = false;
        }
        Some(mutation)
    }
}

// ============================================================================
// Undo / redo
// ============================================================================

pub struct UndoRedoStage {
    history: UndoHistory,
    events: EventBus,
}

impl UndoRedoStage {
    pub fn new(history: UndoHistory, events: EventBus) -> Self {
        Self { history, events }
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    fn notify_change(&self) {
        self.events.publish(Event::UndoStackChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            undo_depth: self.history.depth(),
        });
    }
}

impl MutationStage for UndoRedoStage {
    fn name(&self) -> &'static str {
        "undo-redo"
    }

    fn observe(&mut self, applied: &Applied<'_>, scene: &SceneGraph) {
        if !applied.record || applied.origin == MutationOrigin::History {
            return;
        }
        let mut delta = applied.delta.clone();
        // Edges to transient nodes must not come back on undo.
        if let SceneDelta::NodeRemoved { node, edges, .. } = &mut delta {
            let removed = node.id;
            edges.retain(|e| {
                let other = if e.from == removed { e.to } else { e.from };
                scene.node(other).is_none_or(|n| !n.transient)
            });
        }
        self.history.push(delta, Instant::now());
        self.notify_change();
    }
}

// ============================================================================
// Workspace dirty tracking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceBaseline {
    pub id: Uuid,
    pub group_ids: BTreeSet<u64>,
}

/// Flags the loaded workspace dirty once the set of live node ids differs
/// from the set it was saved with.
pub struct WorkspaceDirtyStage {
    baseline: Option<WorkspaceBaseline>,
    dirty: bool,
    events: EventBus,
}

impl WorkspaceDirtyStage {
    pub fn new(events: EventBus) -> Self {
        Self {
            baseline: None,
            dirty: false,
            events,
        }
    }

    pub fn baseline(&self) -> Option<&WorkspaceBaseline> {
        self.baseline.as_ref()
    }

    pub fn set_baseline(&mut self, baseline: Option<WorkspaceBaseline>) {
        self.baseline = baseline;
        self.dirty = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn evaluate(&mut self, scene: &SceneGraph) {
        let Some(baseline) = &self.baseline else {
            return;
        };
        let (id, dirty) = (baseline.id, scene.group_ids() != baseline.group_ids);
        if dirty != self.dirty {
            self.dirty = dirty;
            self.events.publish(Event::WorkspaceDirtyChanged { id, dirty });
        }
    }
}

impl MutationStage for WorkspaceDirtyStage {
    fn name(&self) -> &'static str {
        "workspace-dirty"
    }

    fn observe(&mut self, applied: &Applied<'_>, scene: &SceneGraph) {
        if applied.origin == MutationOrigin::Restore {
            return;
        }
        if matches!(
            applied.delta,
            SceneDelta::NodeAdded { .. } | SceneDelta::NodeRemoved { .. }
        ) {
            self.evaluate(scene);
        }
    }
}

// ============================================================================
// Focus history
// ============================================================================

#[derive(Debug, Default)]
pub struct FocusHistoryStage {
    history: FocusHistory,
}

impl FocusHistoryStage {
    pub fn history(&self) -> &FocusHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut FocusHistory {
        &mut self.history
    }
}

impl MutationStage for FocusHistoryStage {
    fn name(&self) -> &'static str {
        "focus-history"
    }

    fn observe(&mut self, applied: &Applied<'_>, _scene: &SceneGraph) {
        if let Some(id) = applied.delta.removed_node() {
            self.history.remove(id);
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub max_history: usize,
    /// Seal a pending batch that has been idle this long before adding to it.
    pub auto_commit: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            auto_commit: Some(Duration::from_millis(250)),
        }
    }
}

pub struct MutationPipeline {
    validation: ValidationStage,
    gate: TrackChangesGate,
    undo: UndoRedoStage,
    dirty: WorkspaceDirtyStage,
    focus: FocusHistoryStage,
    spatial: SpatialSortStage,
}

impl MutationPipeline {
    pub fn new(config: PipelineConfig, events: EventBus) -> Self {
        Self {
            validation: ValidationStage,
            gate: TrackChangesGate::default(),
            undo: UndoRedoStage::new(
                UndoHistory::new(config.max_history, config.auto_commit),
                events.clone(),
            ),
            dirty: WorkspaceDirtyStage::new(events),
            focus: FocusHistoryStage::default(),
            spatial: SpatialSortStage::default(),
        }
    }

    fn stages(&mut self) -> [&mut dyn MutationStage; 6] {
        [
            &mut self.validation,
            &mut self.gate,
            &mut self.undo,
            &mut self.dirty,
            &mut self.focus,
            &mut self.spatial,
        ]
    }

    /// Runs `mutation` through every stage and applies it. `Ok(None)` means a
    /// stage vetoed it.
    pub fn dispatch(
        &mut self,
        scene: &mut SceneGraph,
        mutation: Mutation,
    ) -> Result<Option<SceneDelta>, SceneError> {
        let action_name = mutation.action.name();
        let mut mutation = mutation;
        for stage in self.stages() {
            let stage_name = stage.name();
            match stage.intercept(mutation, scene) {
                Some(next) => mutation = next,
                None => {
                    tracing::debug!("{} vetoed by {} stage", action_name, stage_name);
                    return Ok(None);
                }
            }
        }

        let delta = scene.delta_for(&mutation.action)?;
        scene.apply_delta(&delta)?;

        let applied = Applied {
            origin: mutation.origin,
            record: mutation.record,
            delta: &delta,
        };
        for stage in self.stages() {
            stage.observe(&applied, scene);
        }
        Ok(Some(delta))
    }

    pub fn commit(&mut self) -> bool {
        let sealed = self.undo.history.commit();
        if sealed {
            self.undo.notify_change();
        }
        sealed
    }

    /// Reverts the most recent commit, sealing any pending batch first.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> bool {
        let Some(commit) = self.undo.history.take_undo() else {
            return false;
        };
        self.replay(scene, &commit.inverse());
        self.undo.history.push_redo(commit);
        self.undo.notify_change();
        true
    }

    pub fn redo(&mut self, scene: &mut SceneGraph) -> bool {
        let Some(commit) = self.undo.history.take_redo() else {
            return false;
        };
        self.replay(scene, commit.deltas());
        self.undo.history.restore_undo(commit);
        self.undo.notify_change();
        true
    }

    fn replay(&mut self, scene: &mut SceneGraph, deltas: &[SceneDelta]) {
        for delta in deltas {
            if let Err(err) = scene.apply_delta(delta) {
                tracing::warn!("Skipping stale history entry: {}", err);
                continue;
            }
            let applied = Applied {
                origin: MutationOrigin::History,
                record: false,
                delta,
            };
            for stage in self.stages() {
                stage.observe(&applied, scene);
            }
        }
    }

    pub fn track_changes(&self) -> bool {
        self.gate.enabled
    }

    /// Toggling seals the pending batch so it never mixes both modes.
    pub fn set_track_changes(&mut self, enabled: bool) {
        if self.gate.enabled != enabled {
            self.commit();
            self.gate.enabled = enabled;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.history.can_redo()
    }

    pub fn reset_history(&mut self) {
        self.undo.history.clear();
        self.undo.notify_change();
    }

    pub fn workspace(&self) -> &WorkspaceDirtyStage {
        &self.dirty
    }

    pub fn workspace_mut(&mut self) -> &mut WorkspaceDirtyStage {
        &mut self.dirty
    }

    pub fn focus(&self) -> &FocusHistoryStage {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusHistoryStage {
        &mut self.focus
    }

    pub fn spatial_mut(&mut self) -> &mut SpatialSortStage {
        &mut self.spatial
    }
}
