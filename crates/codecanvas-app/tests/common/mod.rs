#![allow(dead_code)]

use async_trait::async_trait;
use codecanvas_app::{CanvasContext, Collaborators};
use codecanvas_core::{DocumentRef, DocumentSymbol, SymbolKind, TextPosition, TextRange};
use codecanvas_graph::{CloseDecision, DocumentHost, SceneError};
use codecanvas_renderer::CanvasSettings;
use codecanvas_resolver::{
    CallHierarchyItem, CallHierarchyProvider, IncomingCall, OutgoingCall, ResolveError,
    StringTextModel, SymbolProvider, TextModel, TextModelSource,
};
use codecanvas_storage::Storage;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Editor host over an in-memory set of files.
#[derive(Default)]
pub struct FakeHost {
    pub files: Mutex<HashSet<PathBuf>>,
    pub dirty: Mutex<HashSet<PathBuf>>,
    pub decision: Mutex<Option<CloseDecision>>,
}

impl FakeHost {
    pub fn with_files(paths: &[&str]) -> Arc<Self> {
        let host = Self::default();
        host.files.lock().extend(paths.iter().map(PathBuf::from));
        Arc::new(host)
    }
}

#[async_trait]
impl DocumentHost for FakeHost {
    async fn open_document(&self, path: &Path) -> Result<DocumentRef, SceneError> {
        if self.files.lock().contains(path) {
            Ok(DocumentRef::from_path(path))
        } else {
            Err(SceneError::Host(format!("{} does not exist", path.display())))
        }
    }

    fn is_dirty(&self, document: &DocumentRef) -> bool {
        self.dirty.lock().contains(&document.path)
    }

    async fn confirm_close(&self, _document: &DocumentRef) -> CloseDecision {
        self.decision.lock().unwrap_or(CloseDecision::Discard)
    }

    async fn save_document(&self, document: &DocumentRef) -> Result<(), SceneError> {
        self.dirty.lock().remove(&document.path);
        Ok(())
    }
}

pub fn item(name: &str, path: &str, range: TextRange) -> CallHierarchyItem {
    CallHierarchyItem {
        name: name.to_string(),
        kind: SymbolKind::Function,
        document: DocumentRef::from_path(path),
        range,
        selection_range: range,
    }
}

/// `main` in /src/main.rs calls `helper` in /src/util.rs.
pub struct FakeCallHierarchy;

#[async_trait]
impl CallHierarchyProvider for FakeCallHierarchy {
    async fn create_root(
        &self,
        _document: &DocumentRef,
        _position: TextPosition,
        _cancel: CancellationToken,
    ) -> Result<Option<CallHierarchyItem>, ResolveError> {
        Ok(Some(item("main", "/src/main.rs", TextRange::new(1, 1, 4, 2))))
    }

    async fn resolve_incoming_calls(
        &self,
        _root: &CallHierarchyItem,
        _cancel: CancellationToken,
    ) -> Result<Vec<IncomingCall>, ResolveError> {
        Ok(Vec::new())
    }

    async fn resolve_outgoing_calls(
        &self,
        _root: &CallHierarchyItem,
        _cancel: CancellationToken,
    ) -> Result<Vec<OutgoingCall>, ResolveError> {
        Ok(vec![OutgoingCall {
            to: item("helper", "/src/util.rs", TextRange::new(2, 1, 4, 2)),
            from_ranges: vec![TextRange::new(2, 5, 2, 13)],
        }])
    }
}

pub struct NoSymbols;

#[async_trait]
impl SymbolProvider for NoSymbols {
    async fn document_symbols(
        &self,
        _document: &DocumentRef,
    ) -> Result<Vec<DocumentSymbol>, ResolveError> {
        Ok(Vec::new())
    }
}

pub struct FakeModels(pub HashMap<PathBuf, String>);

#[async_trait]
impl TextModelSource for FakeModels {
    async fn open_model(&self, document: &DocumentRef) -> Result<Arc<dyn TextModel>, ResolveError> {
        self.0
            .get(&document.path)
            .map(|text| Arc::new(StringTextModel::new(text)) as Arc<dyn TextModel>)
            .ok_or_else(|| ResolveError::ModelUnavailable(document.uri.clone()))
    }
}

pub fn context(host: Arc<FakeHost>) -> CanvasContext {
    let models = HashMap::from([
        (
            PathBuf::from("/src/main.rs"),
            "fn main() {\n    helper();\n}\n".to_string(),
        ),
        (
            PathBuf::from("/src/util.rs"),
            "\npub fn helper() {\n    println!(\"hi\");\n}\n".to_string(),
        ),
    ]);
    let collaborators = Collaborators {
        documents: host,
        call_hierarchy: Arc::new(FakeCallHierarchy),
        symbols: Arc::new(NoSymbols),
        models: Arc::new(FakeModels(models)),
    };
    let settings = CanvasSettings {
        auto_commit_ms: 0,
        glide_duration_ms: 0,
        ..CanvasSettings::default()
    };
    let storage = Storage::new_in_memory().expect("in-memory storage");
    CanvasContext::new(collaborators, storage, settings)
}
