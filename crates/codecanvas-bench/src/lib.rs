//! Shared fixtures for the canvas benchmarks.

use async_trait::async_trait;
use codecanvas_core::{DocumentRef, EdgeKind, NodeId, Vec2};
use codecanvas_events::EventBus;
use codecanvas_graph::{CanvasStore, CloseDecision, DocumentHost, PipelineConfig, SceneError};
use std::path::Path;
use std::sync::Arc;

pub struct NullHost;

#[async_trait]
impl DocumentHost for NullHost {
    async fn open_document(&self, path: &Path) -> Result<DocumentRef, SceneError> {
        Ok(DocumentRef::from_path(path))
    }

    fn is_dirty(&self, _document: &DocumentRef) -> bool {
        false
    }

    async fn confirm_close(&self, _document: &DocumentRef) -> CloseDecision {
        CloseDecision::Discard
    }

    async fn save_document(&self, _document: &DocumentRef) -> Result<(), SceneError> {
        Ok(())
    }
}

pub fn empty_store() -> CanvasStore {
    let config = PipelineConfig {
        max_history: 100,
        auto_commit: None,
    };
    CanvasStore::new(Arc::new(NullHost), EventBus::new(), config)
}

/// A `columns`-wide grid of 400x300 editors, each wired to its right-hand
/// neighbour.
pub fn grid_store(count: usize, columns: usize) -> (CanvasStore, Vec<NodeId>) {
    let mut store = empty_store();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let position = Vec2::new((i % columns) as f64 * 460.0, (i / columns) as f64 * 360.0);
        let id = store.add_node(
            DocumentRef::from_path(format!("/src/module_{i}.rs")),
            position,
            Vec2::new(400.0, 300.0),
        );
        if i % columns != 0 {
            store.add_edge(ids[i - 1], id, EdgeKind::Outgoing);
        }
        ids.push(id);
    }
    store.commit();
    (store, ids)
}
