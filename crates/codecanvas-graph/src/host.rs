use crate::SceneError;
use async_trait::async_trait;
use codecanvas_core::DocumentRef;
use std::path::Path;

/// Answer from the save prompt shown when closing a modified document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Save,
    Discard,
    Cancel,
}

/// The host editor's side of document lifetime.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Reopens a document by path. Fails when the file is gone.
    async fn open_document(&self, path: &Path) -> Result<DocumentRef, SceneError>;

    fn is_dirty(&self, document: &DocumentRef) -> bool;

    /// Shows the save prompt and waits for the user.
    async fn confirm_close(&self, document: &DocumentRef) -> CloseDecision;

    async fn save_document(&self, document: &DocumentRef) -> Result<(), SceneError>;

    /// Called once the node showing `document` is gone.
    fn document_closed(&self, _document: &DocumentRef) {}
}
