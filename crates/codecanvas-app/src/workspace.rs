use crate::CanvasContext;
use anyhow::{Context, Result};
use chrono::Utc;
use codecanvas_core::{NodeId, Rect};
use codecanvas_events::Event;
use codecanvas_graph::{SceneGraph, WorkspaceBaseline};
use codecanvas_storage::{CanvasWorkspace, EdgeLayout, EditorLayout, LAYOUT_VERSION, StorageError, WorkspaceLayout};
use std::collections::BTreeSet;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreReport {
    pub id: Uuid,
    pub name: String,
    pub restored: usize,
    /// Documents that could not be reopened, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Layout of every persistable node and the edges between them.
fn layout_of(scene: &SceneGraph) -> WorkspaceLayout {
    let editors: Vec<EditorLayout> = scene
        .nodes()
        .filter(|node| !node.transient)
        .map(|node| EditorLayout {
            group_id: node.id.0,
            path: node.document.path.clone(),
            x: node.rect.position.x,
            y: node.rect.position.y,
            width: node.rect.size.x,
            height: node.rect.size.y,
            pinned: node.pinned,
            range: node.symbol,
        })
        .collect();
    let kept: BTreeSet<u64> = editors.iter().map(|e| e.group_id).collect();
    let edges = scene
        .edges()
        .filter(|e| kept.contains(&e.from.0) && kept.contains(&e.to.0))
        .map(|e| EdgeLayout {
            from: e.from.0,
            to: e.to.0,
            kind: e.kind,
        })
        .collect();
    WorkspaceLayout {
        version: LAYOUT_VERSION,
        editors,
        edges,
    }
}

impl CanvasContext {
    fn snapshot(&self, id: Uuid, name: &str) -> Result<CanvasWorkspace> {
        let layout = layout_of(self.store.scene());
        let camera = self.store.camera();
        Ok(CanvasWorkspace {
            name: name.to_string(),
            unique_id: id,
            camera_position: camera.position(),
            canvas_scale: camera.scale(),
            serialized_state: layout.to_json()?,
            group_id_set: self.store.scene().group_ids().into_iter().collect(),
            updated_at: Utc::now(),
        })
    }

    fn store_snapshot(&mut self, workspace: CanvasWorkspace) -> Result<CanvasWorkspace> {
        self.storage
            .save_workspace(&workspace)
            .with_context(|| format!("Failed to save workspace {}", workspace.name))?;
        self.store.set_workspace_baseline(Some(WorkspaceBaseline {
            id: workspace.unique_id,
            group_ids: workspace.group_id_set.iter().copied().collect(),
        }));
        tracing::info!(
            "Saved workspace {} ({}) with {} editors",
            workspace.name,
            workspace.unique_id,
            workspace.group_id_set.len()
        );
        self.events.publish(Event::WorkspaceSaved {
            id: workspace.unique_id,
            name: workspace.name.clone(),
        });
        self.current = Some(workspace.clone());
        Ok(workspace)
    }

    /// Saves the canvas as a new workspace under a fresh id.
    pub fn save(&mut self, name: &str) -> Result<CanvasWorkspace> {
        let workspace = self.snapshot(Uuid::new_v4(), name)?;
        self.store_snapshot(workspace)
    }

    /// Re-saves the canvas into an existing workspace, keeping its id and
    /// name.
    pub fn overwrite(&mut self, id: Uuid) -> Result<CanvasWorkspace> {
        let existing = self
            .storage
            .get_workspace(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let workspace = self.snapshot(id, &existing.name)?;
        self.store_snapshot(workspace)
    }

    /// Replaces the canvas with a saved workspace. Every open node is closed
    /// first; `Ok(None)` means the user cancelled at a save prompt and
    /// nothing was loaded.
    pub async fn load(&mut self, id: Uuid) -> Result<Option<RestoreReport>> {
        let workspace = self
            .storage
            .get_workspace(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let layout = WorkspaceLayout::from_json(&workspace.serialized_state)
            .with_context(|| format!("Workspace {} has an unreadable layout", workspace.name))?;

        if !self.store.close_all().await? {
            tracing::info!("Loading {} cancelled", workspace.name);
            return Ok(None);
        }
        self.store.clear_selection();

        let mut restored = BTreeSet::new();
        let mut skipped = Vec::new();
        for editor in &layout.editors {
            let reopened = self.store.host().open_document(&editor.path).await;
            let result = reopened.and_then(|document| {
                self.store.restore_node(
                    NodeId(editor.group_id),
                    document,
                    editor.range,
                    Rect::new(editor.x, editor.y, editor.width, editor.height),
                    editor.pinned,
                )
            });
            match result {
                Ok(node) => {
                    restored.insert(node.0);
                }
                Err(err) => {
                    let reason = err.to_string();
                    tracing::warn!("Skipping {:?} while restoring {}: {}", editor.path, workspace.name, reason);
                    self.events.publish(Event::RestoreWarning {
                        path: editor.path.clone(),
                        reason: reason.clone(),
                    });
                    skipped.push((editor.path.clone(), reason));
                }
            }
        }
        for edge in &layout.edges {
            if restored.contains(&edge.from) && restored.contains(&edge.to) {
                self.store
                    .restore_edge(NodeId(edge.from), NodeId(edge.to), edge.kind);
            }
        }

        self.store
            .set_camera(workspace.camera_position, workspace.canvas_scale);
        self.store.reset_history();
        self.store.set_workspace_baseline(Some(WorkspaceBaseline {
            id: workspace.unique_id,
            group_ids: workspace.group_id_set.iter().copied().collect(),
        }));

        let report = RestoreReport {
            id: workspace.unique_id,
            name: workspace.name.clone(),
            restored: restored.len(),
            skipped,
        };
        tracing::info!(
            "Loaded workspace {}: {} restored, {} skipped",
            report.name,
            report.restored,
            report.skipped.len()
        );
        self.events.publish(Event::WorkspaceLoaded {
            id: report.id,
            name: report.name.clone(),
            restored: report.restored,
            skipped: report.skipped.len(),
        });
        self.current = Some(workspace);
        Ok(Some(report))
    }

    /// Returns false when no such workspace existed.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let deleted = self.storage.delete_workspace(id)?;
        if self.current.as_ref().is_some_and(|w| w.unique_id == id) {
            self.current = None;
            self.store.set_workspace_baseline(None);
        }
        if deleted {
            self.events.publish(Event::WorkspaceDeleted { id });
        }
        Ok(deleted)
    }

    pub fn list(&self) -> Result<Vec<CanvasWorkspace>> {
        Ok(self.storage.list_workspaces()?)
    }

    /// The workspace most recently saved or loaded.
    pub fn current(&self) -> Option<&CanvasWorkspace> {
        self.current.as_ref()
    }

    /// Whether the set of open editors differs from the current workspace.
    pub fn is_dirty(&self) -> bool {
        self.current.is_some() && self.store.is_workspace_dirty()
    }
}
