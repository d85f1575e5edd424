//! Collaborator contracts consumed by the resolver.
//!
//! None of these are implemented here: the host editor supplies them, backed by
//! whatever language server or symbol index it runs.

use crate::ResolveError;
use async_trait::async_trait;
use codecanvas_core::{DocumentRef, DocumentSymbol, SymbolKind, TextPosition, TextRange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A symbol as the call-hierarchy provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallHierarchyItem {
    pub name: String,
    pub kind: SymbolKind,
    pub document: DocumentRef,
    /// Full extent of the symbol.
    pub range: TextRange,
    /// Extent of the symbol's name.
    pub selection_range: TextRange,
}

/// `from` calls the root at each of `from_ranges` (ranges inside `from`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingCall {
    pub from: CallHierarchyItem,
    pub from_ranges: Vec<TextRange>,
}

/// The root calls `to` at each of `from_ranges` (ranges inside the root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingCall {
    pub to: CallHierarchyItem,
    pub from_ranges: Vec<TextRange>,
}

#[async_trait]
pub trait CallHierarchyProvider: Send + Sync {
    /// Resolves the symbol at `position`. `Ok(None)` means there is nothing
    /// callable there.
    async fn create_root(
        &self,
        document: &DocumentRef,
        position: TextPosition,
        cancel: CancellationToken,
    ) -> Result<Option<CallHierarchyItem>, ResolveError>;

    async fn resolve_incoming_calls(
        &self,
        root: &CallHierarchyItem,
        cancel: CancellationToken,
    ) -> Result<Vec<IncomingCall>, ResolveError>;

    async fn resolve_outgoing_calls(
        &self,
        root: &CallHierarchyItem,
        cancel: CancellationToken,
    ) -> Result<Vec<OutgoingCall>, ResolveError>;
}

#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn document_symbols(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<DocumentSymbol>, ResolveError>;
}

/// Read-only view over an open text buffer. Lines are 1-based.
pub trait TextModel: Send + Sync {
    fn line_content(&self, line: u32) -> Option<String>;
    fn line_count(&self) -> u32;
    fn line_max_column(&self, line: u32) -> u32;
    fn position_at(&self, offset: usize) -> TextPosition;
}

#[async_trait]
pub trait TextModelSource: Send + Sync {
    async fn open_model(&self, document: &DocumentRef) -> Result<Arc<dyn TextModel>, ResolveError>;
}

/// Plain in-memory text model, used when the host hands over file contents
/// directly.
#[derive(Debug, Clone, Default)]
pub struct StringTextModel {
    lines: Vec<String>,
}

impl StringTextModel {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect(),
        }
    }
}

impl TextModel for StringTextModel {
    fn line_content(&self, line: u32) -> Option<String> {
        let index = (line as usize).checked_sub(1)?;
        self.lines.get(index).cloned()
    }

    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    fn line_max_column(&self, line: u32) -> u32 {
        self.line_content(line)
            .map_or(1, |l| l.chars().count() as u32 + 1)
    }

    fn position_at(&self, offset: usize) -> TextPosition {
        let mut remaining = offset;
        for (index, line) in self.lines.iter().enumerate() {
            let len = line.chars().count();
            if remaining <= len {
                return TextPosition::new(index as u32 + 1, remaining as u32 + 1);
            }
            // newline
            remaining -= len + 1;
        }
        let last = self.lines.len().max(1) as u32;
        TextPosition::new(last, self.line_max_column(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_model_lines_are_one_based() {
        let model = StringTextModel::new("fn main() {\r\n    run();\n}");
        assert_eq!(model.line_count(), 3);
        assert_eq!(model.line_content(1).as_deref(), Some("fn main() {"));
        assert_eq!(model.line_content(2).as_deref(), Some("    run();"));
        assert_eq!(model.line_content(0), None);
        assert_eq!(model.line_content(4), None);
        assert_eq!(model.line_max_column(3), 2);
    }

    #[test]
    fn test_position_at_offsets() {
        let model = StringTextModel::new("ab\ncd");
        assert_eq!(model.position_at(0), TextPosition::new(1, 1));
        assert_eq!(model.position_at(2), TextPosition::new(1, 3));
        assert_eq!(model.position_at(3), TextPosition::new(2, 1));
        assert_eq!(model.position_at(100), TextPosition::new(2, 3));
    }
}
