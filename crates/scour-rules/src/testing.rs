//! Test harness: one-rule registries, notation trees and small symbol tables.

use scour_core::registry::Rule;
use scour_core::rewrite::{fix_one, FixOptions};
use scour_core::sink::Diagnostic;
use scour_core::symbols::{DeclarationLocation, Symbol, SymbolTable};
use scour_core::tree::notation::parse_tree;
use scour_core::{Dispatcher, NodeRef, Registry, ScourError, SemanticModel, SyntaxTree};

pub(crate) const FILE: &str = "Widget.cs";

pub(crate) fn tree(notation: &str) -> SyntaxTree {
    parse_tree(FILE, notation).unwrap()
}

/// A registry holding a single rule.
pub(crate) struct Harness {
    registry: Registry,
}

impl Harness {
    pub(crate) fn new(rule: impl Rule + 'static) -> Self {
        Harness {
            registry: Registry::builder().register(rule).build().unwrap(),
        }
    }

    pub(crate) fn check(&self, tree: &SyntaxTree, model: &dyn SemanticModel) -> Vec<Diagnostic> {
        Dispatcher::new(&self.registry).run(tree, model).unwrap()
    }

    pub(crate) fn check_compilation(
        &self,
        units: &[SyntaxTree],
        model: &dyn SemanticModel,
    ) -> Vec<Diagnostic> {
        Dispatcher::new(&self.registry)
            .run_compilation(units, model)
            .unwrap()
    }

    pub(crate) fn try_fix(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<SyntaxTree, ScourError> {
        fix_one(tree, model, &self.registry, diagnostic, &FixOptions::default())
    }

    pub(crate) fn fix(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> SyntaxTree {
        self.try_fix(tree, model, diagnostic).unwrap()
    }
}

/// `symbol` with a declaration location at `node`.
pub(crate) fn declared_at(mut symbol: Symbol, node: &NodeRef<'_>) -> Symbol {
    symbol.locations.push(DeclarationLocation {
        file: node.tree().path().to_string(),
        span: node.span(),
    });
    symbol
}

/// A table binding every symbol at its declaration locations.
pub(crate) fn table(symbols: Vec<Symbol>) -> SymbolTable {
    symbols
        .into_iter()
        .fold(SymbolTable::builder(), |builder, symbol| builder.symbol(symbol))
        .bind_declarations()
        .build()
        .unwrap()
}
