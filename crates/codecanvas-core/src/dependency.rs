use crate::{EnumConversionError, SymbolKind, TextRange};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which side of a call-hierarchy root a dependency list describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum DependencyDirection {
    #[default]
    None = 0,
    Incoming = 1,
    Outgoing = 2,
}

impl TryFrom<i32> for DependencyDirection {
    type Error = EnumConversionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DependencyDirection::None),
            1 => Ok(DependencyDirection::Incoming),
            2 => Ok(DependencyDirection::Outgoing),
            _ => Err(EnumConversionError::InvalidDependencyDirection(value)),
        }
    }
}

impl DependencyDirection {
    pub fn edge_kind(&self) -> Option<EdgeKind> {
        match self {
            DependencyDirection::None => None,
            DependencyDirection::Incoming => Some(EdgeKind::Incoming),
            DependencyDirection::Outgoing => Some(EdgeKind::Outgoing),
        }
    }
}

/// Kind of a canvas edge between two placed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Incoming,
    Outgoing,
}

/// One call site between two symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyMetadata {
    /// Source line the call appears on, trimmed for display.
    pub snippet: String,
    pub call_range: TextRange,
    pub from_ranges: Vec<TextRange>,
}

/// A resolved call-hierarchy relationship, ready to be listed or opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDependency {
    pub identifier: String,
    pub file_path: PathBuf,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_type: Option<SymbolKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
    pub metadata: Vec<DependencyMetadata>,
}

impl SymbolDependency {
    /// Key two dependencies are considered the same symbol under.
    pub fn dedup_key(&self) -> (&str, &PathBuf) {
        (&self.identifier, &self.file_path)
    }
}

/// Merges dependencies that name the same symbol in the same file.
///
/// The first occurrence keeps its position in the list; metadata of later
/// duplicates is appended to it in arrival order.
pub fn dedup_dependencies(deps: Vec<SymbolDependency>) -> Vec<SymbolDependency> {
    let mut merged: Vec<SymbolDependency> = Vec::with_capacity(deps.len());
    for dep in deps {
        match merged.iter_mut().find(|m| m.dedup_key() == dep.dedup_key()) {
            Some(existing) => existing.metadata.extend(dep.metadata),
            None => merged.push(dep),
        }
    }
    merged
}
