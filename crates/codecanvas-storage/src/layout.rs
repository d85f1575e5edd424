//! Default editor layout format stored in a workspace's `serialized_state`.

use crate::StorageError;
use codecanvas_core::{EdgeKind, TextRange};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const LAYOUT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorLayout {
    pub group_id: u64,
    pub path: PathBuf,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub pinned: bool,
    /// Symbol the editor was opened for; absent for whole-file editors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLayout {
    pub from: u64,
    pub to: u64,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceLayout {
    pub version: u32,
    #[serde(default)]
    pub editors: Vec<EditorLayout>,
    #[serde(default)]
    pub edges: Vec<EdgeLayout>,
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            editors: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl WorkspaceLayout {
    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// An empty state parses as an empty layout.
    pub fn from_json(text: &str) -> Result<Self, StorageError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let layout: Self = serde_json::from_str(text)?;
        if layout.version > LAYOUT_VERSION {
            return Err(StorageError::Other(format!(
                "Unsupported layout version: {} (max supported: {LAYOUT_VERSION})",
                layout.version
            )));
        }
        Ok(layout)
    }

    pub fn group_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.editors.iter().map(|e| e.group_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_host_layout() {
        let text = r#"{
            "version": 1,
            "editors": [
                {"groupId": 4, "path": "/src/main.rs", "x": 10.5, "y": -3.0, "width": 640.0, "height": 480.0, "pinned": true},
                {"groupId": 2, "path": "/src/lib.rs", "x": 700.0, "y": 0.0, "width": 640.0, "height": 480.0,
                 "range": {"startLine": 3, "startColumn": 1, "endLine": 9, "endColumn": 2}}
            ],
            "edges": [{"from": 4, "to": 2, "kind": "outgoing"}]
        }"#;
        let layout = WorkspaceLayout::from_json(text).unwrap();
        assert_eq!(layout.editors.len(), 2);
        assert!(layout.editors[0].pinned);
        assert!(!layout.editors[1].pinned);
        assert_eq!(layout.editors[0].range, None);
        assert_eq!(layout.editors[1].range, Some(TextRange::new(3, 1, 9, 2)));
        assert_eq!(layout.edges[0].kind, EdgeKind::Outgoing);
        assert_eq!(layout.group_ids(), vec![2, 4]);
    }

    #[test]
    fn test_empty_state_is_empty_layout() {
        assert_eq!(WorkspaceLayout::from_json("  ").unwrap(), WorkspaceLayout::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = WorkspaceLayout::from_json(r#"{"version": 9}"#).unwrap_err();
        assert!(matches!(err, StorageError::Other(_)));
    }
}
