use crate::provider::{
    CallHierarchyItem, IncomingCall, OutgoingCall, SymbolProvider, TextModel, TextModelSource,
};
use codecanvas_core::{
    DependencyMetadata, SymbolDependency, TextRange, dedup_dependencies, find_enclosing_symbol,
};
use std::sync::Arc;

/// Converts raw call-hierarchy results into [`SymbolDependency`] values.
///
/// Call sites get a one-line snippet read through the text-model collaborator.
/// A call whose document cannot be opened is dropped.
pub struct DependencyConverter {
    models: Arc<dyn TextModelSource>,
    symbols: Arc<dyn SymbolProvider>,
}

impl DependencyConverter {
    pub fn new(models: Arc<dyn TextModelSource>, symbols: Arc<dyn SymbolProvider>) -> Self {
        Self { models, symbols }
    }

    pub async fn convert_incoming(&self, calls: Vec<IncomingCall>) -> Vec<SymbolDependency> {
        let mut deps = Vec::with_capacity(calls.len());
        for call in calls {
            let Some(model) = self.model_for(&call.from).await else {
                continue;
            };
            let range = self.symbol_range(&call.from).await;
            let metadata = call
                .from_ranges
                .iter()
                .map(|call_range| DependencyMetadata {
                    snippet: snippet(&*model, call_range),
                    call_range: *call_range,
                    from_ranges: Vec::new(),
                })
                .collect();
            deps.push(dependency(&call.from, range, metadata));
        }
        dedup_dependencies(deps)
    }

    pub async fn convert_outgoing(&self, calls: Vec<OutgoingCall>) -> Vec<SymbolDependency> {
        let mut deps = Vec::with_capacity(calls.len());
        for call in calls {
            let Some(model) = self.model_for(&call.to).await else {
                continue;
            };
            let range = self.symbol_range(&call.to).await;
            let metadata = vec![DependencyMetadata {
                snippet: snippet(&*model, &range),
                call_range: range,
                from_ranges: call.from_ranges.clone(),
            }];
            deps.push(dependency(&call.to, range, metadata));
        }
        dedup_dependencies(deps)
    }

    /// Some providers report a symbol as just its declaration line. Widen that
    /// to the enclosing document symbol so the opened node shows the body.
    async fn symbol_range(&self, item: &CallHierarchyItem) -> TextRange {
        if !item.range.is_single_line() {
            return item.range;
        }
        match self.symbols.document_symbols(&item.document).await {
            Ok(tree) => find_enclosing_symbol(&tree, item.range.start_line)
                .map_or(item.range, |symbol| symbol.range),
            Err(err) => {
                tracing::debug!("No document symbols for {}: {}", item.document.uri, err);
                item.range
            }
        }
    }

    async fn model_for(&self, item: &CallHierarchyItem) -> Option<Arc<dyn TextModel>> {
        match self.models.open_model(&item.document).await {
            Ok(model) => Some(model),
            Err(err) => {
                tracing::warn!("Skipping call into {}: {}", item.document.uri, err);
                None
            }
        }
    }
}

fn dependency(
    item: &CallHierarchyItem,
    range: TextRange,
    metadata: Vec<DependencyMetadata>,
) -> SymbolDependency {
    SymbolDependency {
        identifier: item.name.clone(),
        file_path: item.document.path.clone(),
        uri: item.document.uri.clone(),
        symbol_type: Some(item.kind),
        range: Some(range),
        metadata,
    }
}

fn snippet(model: &dyn TextModel, range: &TextRange) -> String {
    model
        .line_content(range.start_line)
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}
