use super::*;
use crate::MIN_NODE_SIZE;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct FakeHost {
    dirty: Mutex<HashSet<PathBuf>>,
    decision: Mutex<Option<CloseDecision>>,
    saved: Mutex<Vec<PathBuf>>,
    closed: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl DocumentHost for FakeHost {
    async fn open_document(&self, path: &Path) -> Result<DocumentRef, SceneError> {
        Ok(DocumentRef::from_path(path))
    }

    fn is_dirty(&self, document: &DocumentRef) -> bool {
        self.dirty.lock().contains(&document.path)
    }

    async fn confirm_close(&self, _document: &DocumentRef) -> CloseDecision {
        self.decision.lock().unwrap_or(CloseDecision::Discard)
    }

    async fn save_document(&self, document: &DocumentRef) -> Result<(), SceneError> {
        self.dirty.lock().remove(&document.path);
        self.saved.lock().push(document.path.clone());
        Ok(())
    }

    fn document_closed(&self, document: &DocumentRef) {
        self.closed.lock().push(document.path.clone());
    }
}

fn store_with(host: Arc<FakeHost>) -> (CanvasStore, EventBus) {
    let events = EventBus::new();
    let config = PipelineConfig {
        max_history: 100,
        auto_commit: None,
    };
    (CanvasStore::new(host, events.clone(), config), events)
}

fn store() -> CanvasStore {
    store_with(Arc::new(FakeHost::default())).0
}

fn open(store: &mut CanvasStore, name: &str, x: f64) -> NodeId {
    store.add_node(
        DocumentRef::from_path(format!("/src/{name}.rs")),
        Vec2::new(x, 0.0),
        Vec2::new(200.0, 100.0),
    )
}

#[tokio::test]
async fn test_remove_node_prunes_edges() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    assert!(store.add_edge(a, b, EdgeKind::Outgoing));

    let outcome = store.remove_node(b).await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Removed);
    assert_eq!(store.scene().node_count(), 1);
    assert!(store.scene().contains(a));
    assert_eq!(store.scene().edge_count(), 0);
}

#[test]
fn test_add_edge_is_idempotent() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);

    assert!(store.add_edge(a, b, EdgeKind::Outgoing));
    assert!(!store.add_edge(a, b, EdgeKind::Outgoing));
    assert_eq!(store.scene().edge_count(), 1);
}

#[test]
fn test_both_edge_kinds_coexist() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);

    assert!(store.add_edge(a, b, EdgeKind::Incoming));
    assert!(store.add_edge(a, b, EdgeKind::Outgoing));
    assert_eq!(store.scene().edge_count(), 2);
}

#[test]
fn test_edge_to_missing_node_rejected() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    assert!(!store.add_edge(a, NodeId(99), EdgeKind::Outgoing));
    assert!(!store.add_edge(a, a, EdgeKind::Outgoing));
    assert_eq!(store.scene().edge_count(), 0);
}

#[tokio::test]
async fn test_undo_redo_restores_exact_scene() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    store.add_edge(a, b, EdgeKind::Outgoing);
    store.commit();
    let before = store.scene().clone();

    store.move_node(a, Vec2::new(40.0, 80.0)).unwrap();
    store.remove_node(b).await.unwrap();
    store.commit();
    let after = store.scene().clone();

    assert!(store.undo());
    assert_eq!(store.scene(), &before);
    assert!(store.redo());
    assert_eq!(store.scene(), &after);
    assert!(!store.redo());
}

#[test]
fn test_undo_seals_pending_batch() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    store.move_node(a, Vec2::new(10.0, 0.0)).unwrap();
    store.move_node(a, Vec2::new(20.0, 0.0)).unwrap();

    // Everything since the last commit is one step.
    assert!(store.undo());
    assert!(store.scene().is_empty());
    assert!(!store.can_undo());
}

#[test]
fn test_untracked_changes_stay_out_of_history() {
    let mut store = store();
    store.set_track_changes(false);
    let a = open(&mut store, "a", 0.0);
    store.move_node(a, Vec2::new(50.0, 50.0)).unwrap();

    assert!(!store.commit());
    assert!(!store.undo());
    assert!(store.scene().node(a).unwrap().transient);
    assert!(store.scene().group_ids().is_empty());
}

#[test]
fn test_transient_node_never_recorded_after_tracking_resumes() {
    let mut store = store();
    store.set_track_changes(false);
    let ghost = open(&mut store, "ghost", 0.0);
    store.set_track_changes(true);

    store.move_node(ghost, Vec2::new(10.0, 10.0)).unwrap();
    assert!(!store.can_undo());

    let a = open(&mut store, "a", 300.0);
    assert!(store.add_edge(a, ghost, EdgeKind::Incoming));
    store.commit();
    assert!(store.undo());
    assert!(!store.scene().contains(a));
    assert!(store.scene().contains(ghost));
}

#[test]
fn test_preview_moves_are_not_recorded() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    store.commit();
    store.preview_move(a, Vec2::new(90.0, 0.0)).unwrap();
    assert!(!store.commit());
}

#[test]
fn test_move_unknown_node_errors() {
    let mut store = store();
    assert!(matches!(
        store.move_node(NodeId(7), Vec2::ZERO),
        Err(SceneError::UnknownNode(NodeId(7)))
    ));
}

#[test]
fn test_resize_clamps_to_minimum() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    store.resize_node(a, Vec2::new(10.0, 10.0)).unwrap();
    assert_eq!(store.scene().node(a).unwrap().rect.size, MIN_NODE_SIZE);
}

#[test]
fn test_set_camera_clamps_scale() {
    let mut store = store();
    store.set_camera(Vec2::new(10.0, 20.0), 5.0);
    assert_eq!(store.camera().scale(), 2.0);
    store.set_camera(Vec2::new(10.0, 20.0), 0.01);
    assert_eq!(store.camera().scale(), 0.2);
    assert_eq!(store.camera().position(), Vec2::new(10.0, 20.0));
}

#[test]
fn test_box_select_replaces_or_extends() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 500.0);

    store.box_select(Rect::new(-10.0, -10.0, 50.0, 50.0), false);
    assert_eq!(store.selection(), &BTreeSet::from([a]));

    store.box_select(Rect::new(490.0, -10.0, 50.0, 50.0), true);
    assert_eq!(store.selection(), &BTreeSet::from([a, b]));

    store.box_select(Rect::new(490.0, -10.0, 50.0, 50.0), false);
    assert_eq!(store.selection(), &BTreeSet::from([b]));
}

#[tokio::test]
async fn test_cancelled_save_prompt_keeps_node() {
    let host = Arc::new(FakeHost::default());
    let (mut store, events) = store_with(host.clone());
    let a = open(&mut store, "a", 0.0);
    host.dirty.lock().insert(PathBuf::from("/src/a.rs"));
    *host.decision.lock() = Some(CloseDecision::Cancel);
    events.drain();

    let outcome = store.remove_node(a).await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Cancelled);
    assert!(store.scene().contains(a));
    assert!(host.closed.lock().is_empty());
    assert!(
        events
            .drain()
            .iter()
            .any(|e| matches!(e, Event::NodeCloseCancelled { id } if *id == a))
    );
}

#[tokio::test]
async fn test_save_decision_saves_then_closes() {
    let host = Arc::new(FakeHost::default());
    let (mut store, _events) = store_with(host.clone());
    let a = open(&mut store, "a", 0.0);
    host.dirty.lock().insert(PathBuf::from("/src/a.rs"));
    *host.decision.lock() = Some(CloseDecision::Save);

    let outcome = store.remove_node(a).await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Removed);
    assert_eq!(host.saved.lock().as_slice(), &[PathBuf::from("/src/a.rs")]);
    assert_eq!(host.closed.lock().len(), 1);
    assert!(store.scene().is_empty());
}

#[tokio::test]
async fn test_close_all_stops_at_cancel() {
    let host = Arc::new(FakeHost::default());
    let (mut store, _events) = store_with(host.clone());
    open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    open(&mut store, "c", 600.0);
    host.dirty.lock().insert(PathBuf::from("/src/b.rs"));
    *host.decision.lock() = Some(CloseDecision::Cancel);

    assert!(!store.close_all().await.unwrap());
    assert_eq!(store.scene().node_count(), 2);
    assert!(store.scene().contains(b));
}

#[tokio::test]
async fn test_workspace_dirty_follows_group_ids() {
    let (mut store, events) = store_with(Arc::new(FakeHost::default()));
    let a = open(&mut store, "a", 0.0);
    let baseline = WorkspaceBaseline {
        id: uuid::Uuid::new_v4(),
        group_ids: store.scene().group_ids(),
    };
    store.set_workspace_baseline(Some(baseline));
    assert!(!store.is_workspace_dirty());
    events.drain();

    let b = open(&mut store, "b", 300.0);
    assert!(store.is_workspace_dirty());

    store.remove_node(b).await.unwrap();
    assert!(!store.is_workspace_dirty());
    assert!(store.scene().contains(a));

    let flips = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, Event::WorkspaceDirtyChanged { .. }))
        .count();
    assert_eq!(flips, 2);
}

#[test]
fn test_focus_history_survives_removal() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    store.focus(a);
    store.focus(b);
    assert_eq!(store.scene().z_index(b), Some(1));
    assert_eq!(store.focus_back(), Some(a));
    assert_eq!(store.scene().z_index(a), Some(1));
    assert_eq!(store.focus_forward(), Some(b));
}

#[test]
fn test_focus_next_walks_reading_order() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    let c = open(&mut store, "c", 600.0);
    assert_eq!(store.sorted_nodes(), vec![a, b, c]);

    assert_eq!(store.focus_next(TraversalDirection::Next), Some(a));
    assert_eq!(store.focused(), Some(a));
    assert_eq!(store.focus_next(TraversalDirection::Next), Some(b));
    assert_eq!(store.selection().iter().copied().collect::<Vec<_>>(), vec![b]);
    assert_eq!(store.focus_next(TraversalDirection::Next), Some(c));
    assert_eq!(store.focus_next(TraversalDirection::Next), Some(a));
    assert_eq!(store.focus_next(TraversalDirection::Previous), Some(c));
}

#[test]
fn test_reading_order_follows_moves() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    let c = open(&mut store, "c", 600.0);
    store.select(a, false);

    store.move_node(c, Vec2::new(-400.0, 0.0)).unwrap();
    assert_eq!(store.sorted_nodes(), vec![c, a, b]);
    assert_eq!(store.next_node(TraversalDirection::Next), Some(b));
    assert_eq!(store.next_node(TraversalDirection::Next), Some(c));

    // A new selection restarts the walk beside it.
    store.select(c, false);
    assert_eq!(store.next_node(TraversalDirection::Previous), Some(b));
}

#[test]
fn test_viewport_shortcuts_count_visible_nodes() {
    let mut store = store();
    let a = open(&mut store, "a", 0.0);
    let b = open(&mut store, "b", 300.0);
    let far = open(&mut store, "far", 5000.0);

    assert_eq!(store.nth_in_viewport(1), Some(a));
    assert_eq!(store.nth_in_viewport(2), Some(b));
    assert_eq!(store.nth_in_viewport(3), None);
    assert_eq!(store.enumeration_in_viewport(b), Some(2));
    assert_eq!(store.enumeration_in_viewport(far), None);

    store.set_camera(Vec2::new(5100.0, 50.0), 1.0);
    assert_eq!(store.nth_in_viewport(1), Some(far));
    assert_eq!(store.enumeration_in_viewport(a), None);
}
