//! Host interchange: the JSON documents a host parser and binder hand over.
//!
//! A unit snapshot gives the full text and a tree whose tokens carry byte
//! offsets. Everything between tokens must be trivia; the importer lexes it
//! and lets [`TreeBuilder`] attach it.
//!
//! ```json
//! {
//!   "units": [{
//!     "path": "src/A.cs",
//!     "text": "class A { }",
//!     "root": { "kind": "compilation_unit", "children": [
//!       { "kind": "class_declaration", "children": [
//!         { "kind": "keyword", "start": 0, "end": 5 },
//!         { "kind": "identifier", "start": 6, "end": 7 },
//!         { "kind": "punctuation", "start": 8, "end": 9 },
//!         { "kind": "punctuation", "start": 10, "end": 11 }
//!       ]}
//!     ]}
//!   }],
//!   "symbols": { "symbols": [], "bindings": [] }
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScourError;
use crate::exclusion::is_compilation_excluded;
use crate::symbols::{SemanticModel, Symbol, SymbolError, SymbolId, SymbolTable, Unbound};
use crate::tree::trivia::lex_trivia;
use crate::tree::{GreenNode, SyntaxKind, SyntaxTree, TreeBuilder, TreeError};
use crate::types::Span;

// ============================================================================
// Units
// ============================================================================

/// One tree element as the host writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementSnapshot {
    Token {
        kind: String,
        start: usize,
        end: usize,
    },
    Node {
        kind: String,
        #[serde(default)]
        children: Vec<ElementSnapshot>,
    },
}

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub path: String,
    pub text: String,
    pub root: ElementSnapshot,
}

impl UnitSnapshot {
    /// Validate the snapshot and build its tree.
    pub fn build(&self) -> Result<SyntaxTree, TreeError> {
        let mut importer = Importer {
            text: &self.text,
            cursor: 0,
            builder: TreeBuilder::new(),
        };
        importer.element(&self.root)?;
        importer.finish(&self.path)
    }

    /// Snapshot of an existing tree.
    pub fn from_tree(tree: &SyntaxTree) -> Self {
        let mut offset = 0;
        UnitSnapshot {
            path: tree.path().to_string(),
            text: tree.text().to_string(),
            root: export(tree.green(), &mut offset),
        }
    }
}

struct Importer<'a> {
    text: &'a str,
    cursor: usize,
    builder: TreeBuilder,
}

impl Importer<'_> {
    fn element(&mut self, element: &ElementSnapshot) -> Result<(), TreeError> {
        match element {
            ElementSnapshot::Token { kind, start, end } => {
                let kind = parse_kind(kind, *start)?;
                self.token(kind, *start, *end)
            }
            ElementSnapshot::Node { kind, children } => {
                let kind = parse_kind(kind, self.cursor)?;
                self.builder.start_node(kind)?;
                for child in children {
                    self.element(child)?;
                }
                self.builder.finish_node()
            }
        }
    }

    fn token(&mut self, kind: SyntaxKind, start: usize, end: usize) -> Result<(), TreeError> {
        let violation = |message: &str| TreeError::SpanInvariant {
            offset: start,
            message: message.to_string(),
        };
        if start < self.cursor {
            return Err(violation("token overlaps or precedes the previous token"));
        }
        if end <= start {
            return Err(violation("token is empty or reversed"));
        }
        if end > self.text.len() {
            return Err(violation("token ends past the end of the text"));
        }
        if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
            return Err(violation("token boundary splits a character"));
        }

        self.gap(start)?;
        self.builder.token(kind, &self.text[start..end])?;
        self.cursor = end;
        Ok(())
    }

    /// Lex the uncovered text up to `until` as trivia.
    fn gap(&mut self, until: usize) -> Result<(), TreeError> {
        let pieces = lex_trivia(&self.text[self.cursor..until], self.cursor)?;
        self.builder.trivia_all(pieces);
        Ok(())
    }

    fn finish(mut self, path: &str) -> Result<SyntaxTree, TreeError> {
        self.gap(self.text.len())?;
        let root = self.builder.finish()?;
        Ok(SyntaxTree::new(path, root))
    }
}

fn parse_kind(name: &str, offset: usize) -> Result<SyntaxKind, TreeError> {
    SyntaxKind::from_name(name).ok_or_else(|| TreeError::SpanInvariant {
        offset,
        message: format!("unknown syntax kind '{}'", name),
    })
}

fn export(node: &GreenNode, offset: &mut usize) -> ElementSnapshot {
    if let Some((leading, text, trailing)) = node.token_parts() {
        let start = *offset + leading.iter().map(|t| t.len()).sum::<usize>();
        let end = start + text.len();
        *offset = end + trailing.iter().map(|t| t.len()).sum::<usize>();
        return ElementSnapshot::Token {
            kind: node.kind().name().to_string(),
            start,
            end,
        };
    }
    ElementSnapshot::Node {
        kind: node.kind().name().to_string(),
        children: node.children().iter().map(|c| export(c, offset)).collect(),
    }
}

// ============================================================================
// Symbols
// ============================================================================

/// A node-to-symbol binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSnapshot {
    pub file: String,
    pub span: Span,
    pub symbol: SymbolId,
}

/// The binder's output for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub bindings: Vec<BindingSnapshot>,
}

impl SymbolSnapshot {
    /// Build a validated table. Declaration locations are bound too.
    pub fn build(&self) -> Result<SymbolTable, SymbolError> {
        let mut builder = SymbolTable::builder();
        for symbol in &self.symbols {
            builder = builder.symbol(symbol.clone());
        }
        for binding in &self.bindings {
            builder = builder.bind(binding.file.clone(), binding.span, binding.symbol);
        }
        builder.bind_declarations().build()
    }

    pub fn from_table(table: &SymbolTable) -> Self {
        SymbolSnapshot {
            symbols: table.symbols().cloned().collect(),
            bindings: table
                .bindings()
                .into_iter()
                .map(|(file, span, symbol)| BindingSnapshot {
                    file: file.to_string(),
                    span,
                    symbol,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Compilations
// ============================================================================

/// The input document of the command-line front door.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationSnapshot {
    pub units: Vec<UnitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<SymbolSnapshot>,
}

impl CompilationSnapshot {
    pub fn from_json(json: &str) -> Result<Self, ScourError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScourError> {
        let json = fs::read_to_string(path)
            .map_err(|_| ScourError::file_not_found(path.display().to_string()))?;
        Self::from_json(&json)
    }

    /// Validate every unit and the symbol table.
    pub fn build(&self) -> Result<Compilation, ScourError> {
        let mut seen = HashSet::new();
        let mut units = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            if !seen.insert(unit.path.as_str()) {
                return Err(ScourError::InvalidSnapshot {
                    message: format!("unit {} appears more than once", unit.path),
                });
            }
            let tree = unit.build().map_err(|err| ScourError::InvalidSnapshot {
                message: format!("{}: {}", unit.path, err),
            })?;
            units.push(tree);
        }
        let symbols = self.symbols.as_ref().map(SymbolSnapshot::build).transpose()?;
        debug!(
            units = units.len(),
            symbols = symbols.as_ref().map_or(0, SymbolTable::len),
            "snapshot loaded"
        );
        Ok(Compilation { units, symbols })
    }
}

/// A loaded compilation: trees plus, when the host bound them, symbols.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub units: Vec<SyntaxTree>,
    pub symbols: Option<SymbolTable>,
}

impl Compilation {
    /// The symbol table, or [`Unbound`] when the host sent none.
    pub fn model(&self) -> &dyn SemanticModel {
        match &self.symbols {
            Some(table) => table,
            None => &Unbound,
        }
    }

    /// True if an assembly-level generated-code marker in any unit, or on
    /// the bound assembly, excludes the whole compilation.
    pub fn is_generated(&self) -> bool {
        is_compilation_excluded(&self.units, self.model())
    }

    pub fn unit(&self, path: &str) -> Option<&SyntaxTree> {
        self.units.iter().find(|u| u.path() == path)
    }

    pub fn to_snapshot(&self) -> CompilationSnapshot {
        CompilationSnapshot {
            units: self.units.iter().map(UnitSnapshot::from_tree).collect(),
            symbols: self.symbols.as_ref().map(SymbolSnapshot::from_table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;
    use crate::tree::notation::parse_tree;

    fn token(kind: &str, start: usize, end: usize) -> ElementSnapshot {
        ElementSnapshot::Token {
            kind: kind.to_string(),
            start,
            end,
        }
    }

    fn node(kind: &str, children: Vec<ElementSnapshot>) -> ElementSnapshot {
        ElementSnapshot::Node {
            kind: kind.to_string(),
            children,
        }
    }

    fn class_a(text: &str) -> UnitSnapshot {
        UnitSnapshot {
            path: "A.cs".to_string(),
            text: text.to_string(),
            root: node(
                "compilation_unit",
                vec![node(
                    "class_declaration",
                    vec![
                        token("keyword", 0, 5),
                        token("identifier", 6, 7),
                        token("punctuation", 8, 9),
                        token("punctuation", 10, 11),
                    ],
                )],
            ),
        }
    }

    mod units {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn gaps_become_attached_trivia() {
            let tree = class_a("class A {\n}\n").build().unwrap();
            assert_eq!(tree.text(), "class A {\n}\n");
            let open = tree.root().descendants()[3].clone();
            assert_eq!(open.token_text(), Some("{"));
            assert_eq!(open.trailing_trivia().len(), 1);
            let close = tree.root().last_token().unwrap();
            assert_eq!(close.span(), Span::new(10, 11));
            assert_eq!(close.full_span(), Span::new(10, 12));
        }

        #[test]
        fn uncovered_text_is_a_span_violation() {
            let err = class_a("class A {x}").build().unwrap_err();
            assert!(matches!(err, TreeError::SpanInvariant { offset: 9, .. }));
        }

        #[test]
        fn overlapping_tokens_are_rejected() {
            let mut unit = class_a("class A { }");
            unit.root = node(
                "compilation_unit",
                vec![token("keyword", 0, 5), token("identifier", 4, 7)],
            );
            let err = unit.build().unwrap_err();
            assert!(matches!(err, TreeError::SpanInvariant { offset: 4, .. }));
        }

        #[test]
        fn tokens_past_the_end_are_rejected() {
            let err = class_a("class A {").build().unwrap_err();
            assert!(matches!(err, TreeError::SpanInvariant { offset: 10, .. }));
        }

        #[test]
        fn tokens_must_sit_on_char_boundaries() {
            let unit = UnitSnapshot {
                path: "A.cs".to_string(),
                text: "é".to_string(),
                root: node("compilation_unit", vec![token("identifier", 0, 1)]),
            };
            assert!(matches!(unit.build(), Err(TreeError::SpanInvariant { .. })));
        }

        #[test]
        fn unknown_kind_is_rejected() {
            let unit = UnitSnapshot {
                path: "A.cs".to_string(),
                text: "x".to_string(),
                root: node("lambda_soup", vec![token("identifier", 0, 1)]),
            };
            assert!(unit.build().is_err());
        }

        #[test]
        fn export_matches_import() {
            let tree = parse_tree(
                "B.cs",
                r#"(compilation_unit (class_declaration "// c\n" "class " "B" " " "{" " " "}" "\n"))"#,
            )
            .unwrap();
            let snapshot = UnitSnapshot::from_tree(&tree);
            let rebuilt = snapshot.build().unwrap();
            assert_eq!(rebuilt.text(), tree.text());
            assert_eq!(rebuilt.green(), tree.green());
        }

        #[test]
        fn parses_from_json() {
            let json = r#"{
                "units": [{
                    "path": "A.cs",
                    "text": "class A { }",
                    "root": { "kind": "compilation_unit", "children": [
                        { "kind": "class_declaration", "children": [
                            { "kind": "keyword", "start": 0, "end": 5 },
                            { "kind": "identifier", "start": 6, "end": 7 },
                            { "kind": "punctuation", "start": 8, "end": 9 },
                            { "kind": "punctuation", "start": 10, "end": 11 }
                        ]}
                    ]}
                }]
            }"#;
            let compilation = CompilationSnapshot::from_json(json).unwrap().build().unwrap();
            assert_eq!(compilation.units.len(), 1);
            assert!(compilation.symbols.is_none());
            assert!(!compilation.model().is_bound());
        }
    }

    mod symbols {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::symbols::DeclarationLocation;

        fn snapshot() -> CompilationSnapshot {
            let mut class = Symbol::new(1, SymbolKind::NamedType, "A");
            class.locations.push(DeclarationLocation {
                file: "A.cs".to_string(),
                span: Span::new(0, 11),
            });
            CompilationSnapshot {
                units: vec![class_a("class A { }")],
                symbols: Some(SymbolSnapshot {
                    symbols: vec![Symbol::new(0, SymbolKind::Assembly, "App"), class],
                    bindings: vec![BindingSnapshot {
                        file: "A.cs".to_string(),
                        span: Span::new(6, 7),
                        symbol: SymbolId(1),
                    }],
                }),
            }
        }

        #[test]
        fn bindings_and_declarations_resolve() {
            let compilation = snapshot().build().unwrap();
            let tree = compilation.unit("A.cs").unwrap();
            let model = compilation.model();
            let class = tree.root().descendants_of_kind(SyntaxKind::ClassDeclaration)[0].clone();
            assert_eq!(model.resolve(tree, &class).map(|s| s.name.as_str()), Some("A"));
            let name = class.child_of_kind(SyntaxKind::Identifier).unwrap();
            assert_eq!(model.resolve(tree, &name).map(|s| s.id), Some(SymbolId(1)));
            assert_eq!(model.assembly().map(|s| s.name.as_str()), Some("App"));
        }

        #[test]
        fn invalid_symbols_are_invalid_snapshots() {
            let mut doc = snapshot();
            if let Some(symbols) = doc.symbols.as_mut() {
                symbols.bindings[0].symbol = SymbolId(42);
            }
            assert!(matches!(doc.build(), Err(ScourError::InvalidSnapshot { .. })));
        }

        #[test]
        fn duplicate_units_are_rejected() {
            let mut doc = snapshot();
            doc.units.push(doc.units[0].clone());
            assert!(matches!(doc.build(), Err(ScourError::InvalidSnapshot { .. })));
        }

        #[test]
        fn table_survives_a_round_trip() {
            let compilation = snapshot().build().unwrap();
            let again = compilation.to_snapshot().build().unwrap();
            let table = again.symbols.unwrap();
            assert_eq!(table.len(), 2);
            assert_eq!(table.lookup("A.cs", Span::new(6, 7)).map(|s| s.id), Some(SymbolId(1)));
            assert_eq!(table.lookup("A.cs", Span::new(0, 11)).map(|s| s.id), Some(SymbolId(1)));
        }
    }
}
