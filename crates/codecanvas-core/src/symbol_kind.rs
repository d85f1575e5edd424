//! Symbol kind classification.
//!
//! Symbol providers report kinds as integers. Everything here is a pure mapping
//! from that integer domain into the small set of categories the canvas cares
//! about: whether a symbol can hold children, whether it is worth navigating to,
//! and which header class and icon it is drawn with. Unknown integers map to
//! [`SymbolKind::Other`] and fall through the default arms.

use crate::TextRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
    /// A kind this build does not know about yet.
    Other(i32),
}

impl From<i32> for SymbolKind {
    fn from(value: i32) -> Self {
        match value {
            0 => SymbolKind::File,
            1 => SymbolKind::Module,
            2 => SymbolKind::Namespace,
            3 => SymbolKind::Package,
            4 => SymbolKind::Class,
            5 => SymbolKind::Method,
            6 => SymbolKind::Property,
            7 => SymbolKind::Field,
            8 => SymbolKind::Constructor,
            9 => SymbolKind::Enum,
            10 => SymbolKind::Interface,
            11 => SymbolKind::Function,
            12 => SymbolKind::Variable,
            13 => SymbolKind::Constant,
            14 => SymbolKind::String,
            15 => SymbolKind::Number,
            16 => SymbolKind::Boolean,
            17 => SymbolKind::Array,
            18 => SymbolKind::Object,
            19 => SymbolKind::Key,
            20 => SymbolKind::Null,
            21 => SymbolKind::EnumMember,
            22 => SymbolKind::Struct,
            23 => SymbolKind::Event,
            24 => SymbolKind::Operator,
            25 => SymbolKind::TypeParameter,
            other => SymbolKind::Other(other),
        }
    }
}

impl From<SymbolKind> for i32 {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::File => 0,
            SymbolKind::Module => 1,
            SymbolKind::Namespace => 2,
            SymbolKind::Package => 3,
            SymbolKind::Class => 4,
            SymbolKind::Method => 5,
            SymbolKind::Property => 6,
            SymbolKind::Field => 7,
            SymbolKind::Constructor => 8,
            SymbolKind::Enum => 9,
            SymbolKind::Interface => 10,
            SymbolKind::Function => 11,
            SymbolKind::Variable => 12,
            SymbolKind::Constant => 13,
            SymbolKind::String => 14,
            SymbolKind::Number => 15,
            SymbolKind::Boolean => 16,
            SymbolKind::Array => 17,
            SymbolKind::Object => 18,
            SymbolKind::Key => 19,
            SymbolKind::Null => 20,
            SymbolKind::EnumMember => 21,
            SymbolKind::Struct => 22,
            SymbolKind::Event => 23,
            SymbolKind::Operator => 24,
            SymbolKind::TypeParameter => 25,
            SymbolKind::Other(value) => value,
        }
    }
}

/// Display category of a symbol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolCategory {
    File,
    Function,
    Class,
    Variable,
}

impl SymbolCategory {
    pub fn css_class(&self) -> &'static str {
        match self {
            SymbolCategory::File => "fileSymbol",
            SymbolCategory::Function => "functionSymbol",
            SymbolCategory::Class => "classSymbol",
            SymbolCategory::Variable => "variableSymbol",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SymbolCategory::File => "symbol-file",
            SymbolCategory::Function => "symbol-method",
            SymbolCategory::Class => "symbol-class",
            SymbolCategory::Variable => "symbol-variable",
        }
    }
}

impl SymbolKind {
    /// Kinds that can hold children and take part in call hierarchies.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Struct
                | SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Constructor
        )
    }

    /// Leaf-ish kinds are only worth navigating to when they have children.
    pub fn is_valid_symbol(&self, child_count: usize) -> bool {
        match self {
            SymbolKind::Variable
            | SymbolKind::Constant
            | SymbolKind::Array
            | SymbolKind::Boolean
            | SymbolKind::TypeParameter
            | SymbolKind::String
            | SymbolKind::EnumMember
            | SymbolKind::Field
            | SymbolKind::Null
            | SymbolKind::Key
            | SymbolKind::Property
            | SymbolKind::Object
            | SymbolKind::Number => child_count > 0,
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }

    pub fn is_function_like(&self) -> bool {
        self.is_callable() || *self == SymbolKind::Constructor
    }

    /// Kinds shown in the outline summary of a node.
    pub fn is_notable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Module
                | SymbolKind::Struct
                | SymbolKind::Enum
        )
    }

    pub fn category(&self) -> SymbolCategory {
        match self {
            SymbolKind::File => SymbolCategory::File,
            SymbolKind::Method | SymbolKind::Function => SymbolCategory::Function,
            SymbolKind::Class
            | SymbolKind::Interface
            | SymbolKind::Enum
            | SymbolKind::Struct
            | SymbolKind::Module => SymbolCategory::Class,
            _ => SymbolCategory::Variable,
        }
    }
}

/// Header class for an optional kind. A missing kind is drawn as a file header.
pub fn header_class(kind: Option<SymbolKind>) -> &'static str {
    kind.map_or(SymbolCategory::File, |k| k.category()).css_class()
}

/// Node of the tree a document-symbol provider returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: TextRange,
    #[serde(default)]
    pub children: Vec<DocumentSymbol>,
}

impl DocumentSymbol {
    pub fn is_valid(&self) -> bool {
        self.kind.is_valid_symbol(self.children.len())
    }
}

/// Returns the innermost symbol whose range covers `line`.
pub fn find_enclosing_symbol(symbols: &[DocumentSymbol], line: u32) -> Option<&DocumentSymbol> {
    let mut level = symbols;
    let mut found = None;
    while let Some(symbol) = level.iter().find(|s| s.range.contains_line(line)) {
        found = Some(symbol);
        level = &symbol.children;
    }
    found
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    const CATEGORY_CLASSES: [&str; 4] =
        ["fileSymbol", "functionSymbol", "classSymbol", "variableSymbol"];

    proptest! {
        #[test]
        fn prop_any_kind_maps_into_fixed_domain(raw in any::<i32>(), children in 0usize..4) {
            let kind = SymbolKind::from(raw);
            prop_assert!(CATEGORY_CLASSES.contains(&kind.category().css_class()));
            prop_assert_eq!(i32::from(kind), raw);
            // Containers are always navigable.
            if kind.is_container() {
                prop_assert!(kind.is_valid_symbol(children));
            }
        }

        #[test]
        fn prop_unknown_kinds_default_to_leaf(raw in prop_oneof![i32::MIN..0, 26..i32::MAX]) {
            let kind = SymbolKind::from(raw);
            prop_assert_eq!(kind, SymbolKind::Other(raw));
            prop_assert!(!kind.is_container());
            prop_assert_eq!(kind.category(), SymbolCategory::Variable);
        }
    }
}
