//! Single-pass rule dispatch.
//!
//! A pass walks the unit once in source order and plans every
//! (rule, node) and (rule, symbol) invocation, skipping excluded scopes
//! without descending into them. The planned invocations then run, on the
//! rayon pool when parallel dispatch is enabled, each isolated so that a
//! faulting or panicking rule only loses its own findings.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info_span, warn};

use crate::config::ScourSettings;
use crate::error::ScourError;
use crate::exclusion::{has_ignorable_attributes, is_compilation_excluded, ExclusionFilter};
use crate::registry::{Finding, NodeContext, Registry, RegisteredRule, Rule, RuleOutcome, SymbolContext};
use crate::sink::{Diagnostic, DiagnosticLocation, DiagnosticSink};
use crate::symbols::{SemanticModel, Symbol, SymbolKind};
use crate::tree::{walk, NodeRef, SyntaxTree, VisitResult, Visitor};

// ============================================================================
// Options
// ============================================================================

/// Cooperative cancellation flag, checked at every node boundary and before
/// every rule invocation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Run invocations (and units) on the rayon pool.
    pub parallel: bool,
    pub cancellation: Option<CancellationToken>,
}

impl DispatchOptions {
    pub fn from_settings(settings: &ScourSettings) -> Self {
        DispatchOptions {
            parallel: settings.parallel,
            cancellation: None,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

enum Invocation<'t> {
    Node {
        rule: usize,
        node: NodeRef<'t>,
    },
    Symbol {
        rule: usize,
        node: NodeRef<'t>,
        symbol: &'t Symbol,
    },
}

/// Runs a registry over units.
#[derive(Debug, Clone)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    options: DispatchOptions,
    only: Option<usize>,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Dispatcher {
            registry,
            options: DispatchOptions::default(),
            only: None,
        }
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// A dispatcher that runs only `rule_id`.
    pub fn only(&self, rule_id: &str) -> Result<Dispatcher<'r>, ScourError> {
        let index = self
            .registry
            .index_of(rule_id)
            .ok_or_else(|| ScourError::UnknownRule {
                id: rule_id.to_string(),
            })?;
        Ok(Dispatcher {
            only: Some(index),
            ..self.clone()
        })
    }

    /// Analyze one unit. Assembly subscriptions do not fire here; see
    /// [`Dispatcher::run_compilation`].
    pub fn run(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
    ) -> Result<Vec<Diagnostic>, ScourError> {
        let sink = DiagnosticSink::new();
        self.run_into(tree, model, &sink)?;
        Ok(sink.drain())
    }

    /// Analyze every unit of a compilation, then the assembly.
    pub fn run_compilation(
        &self,
        units: &[SyntaxTree],
        model: &dyn SemanticModel,
    ) -> Result<Vec<Diagnostic>, ScourError> {
        let _span = info_span!("compilation", units = units.len()).entered();

        if is_compilation_excluded(units, model) {
            debug!("assembly is marked as generated code, nothing to analyze");
            return Ok(Vec::new());
        }

        let sink = DiagnosticSink::new();
        if self.options.parallel {
            units
                .par_iter()
                .try_for_each(|unit| self.run_into(unit, model, &sink))?;
        } else {
            for unit in units {
                self.run_into(unit, model, &sink)?;
            }
        }
        self.run_assembly(model, &sink)?;
        Ok(sink.drain())
    }

    fn run_into(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        sink: &DiagnosticSink,
    ) -> Result<(), ScourError> {
        let _span = info_span!("dispatch", file = tree.path()).entered();

        let mut filter = ExclusionFilter::new(model);
        if filter.is_unit_excluded(tree) {
            debug!("unit excluded as generated code");
            return Ok(());
        }

        let mut planner = Planner {
            dispatcher: self,
            tree,
            model,
            filter,
            seen: HashSet::new(),
            invocations: Vec::new(),
            cancelled: false,
        };
        walk(&tree.root(), &mut planner);
        if planner.cancelled {
            return Err(ScourError::Cancelled);
        }

        let invocations = planner.invocations;
        debug!(invocations = invocations.len(), "planned");

        let results: Vec<Vec<Diagnostic>> = if self.options.parallel {
            invocations
                .par_iter()
                .map(|inv| self.invoke(tree, model, inv))
                .collect()
        } else {
            invocations
                .iter()
                .map(|inv| self.invoke(tree, model, inv))
                .collect()
        };
        self.check_cancelled()?;

        sink.extend(results.into_iter().flatten());
        Ok(())
    }

    fn run_assembly(
        &self,
        model: &dyn SemanticModel,
        sink: &DiagnosticSink,
    ) -> Result<(), ScourError> {
        let Some(assembly) = model.assembly() else {
            return Ok(());
        };
        if has_ignorable_attributes(&assembly.attributes) {
            return Ok(());
        }
        for &rule in self.registry.symbol_rules(SymbolKind::Assembly) {
            if !self.selects(rule) {
                continue;
            }
            self.check_cancelled()?;
            let ctx = SymbolContext {
                symbol: assembly,
                model,
                declaration: None,
            };
            sink.extend(self.execute(rule, None, |r| r.check_symbol(&ctx)));
        }
        Ok(())
    }

    fn invoke(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        invocation: &Invocation<'_>,
    ) -> Vec<Diagnostic> {
        if self.is_cancelled() {
            return Vec::new();
        }
        match invocation {
            Invocation::Node { rule, node } => {
                let ctx = NodeContext {
                    tree,
                    node: node.clone(),
                    model,
                };
                self.execute(*rule, Some(tree), |r| r.check_node(&ctx))
            }
            Invocation::Symbol { rule, node, symbol } => {
                let ctx = SymbolContext {
                    symbol,
                    model,
                    declaration: Some((tree, node.clone())),
                };
                self.execute(*rule, Some(tree), |r| r.check_symbol(&ctx))
            }
        }
    }

    /// Run one callback in isolation and turn its findings into diagnostics.
    fn execute<F>(&self, rule: usize, tree: Option<&SyntaxTree>, call: F) -> Vec<Diagnostic>
    where
        F: FnOnce(&dyn Rule) -> RuleOutcome,
    {
        let entry = self.registry.entry(rule);
        let file = tree.map(SyntaxTree::path).unwrap_or("<compilation>");
        match catch_unwind(AssertUnwindSafe(|| call(entry.rule()))) {
            Ok(Ok(findings)) => findings
                .into_iter()
                .map(|f| to_diagnostic(entry, tree, f))
                .collect(),
            Ok(Err(fault)) => {
                warn!(rule = entry.id(), file, %fault, "rule fault, invocation skipped");
                Vec::new()
            }
            Err(payload) => {
                warn!(
                    rule = entry.id(),
                    file,
                    panic = panic_message(payload.as_ref()),
                    "rule panicked, invocation skipped"
                );
                Vec::new()
            }
        }
    }

    fn selects(&self, rule: usize) -> bool {
        match self.only {
            Some(only) => only == rule,
            None => true,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn check_cancelled(&self) -> Result<(), ScourError> {
        if self.is_cancelled() {
            Err(ScourError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn to_diagnostic(entry: &RegisteredRule, tree: Option<&SyntaxTree>, finding: Finding) -> Diagnostic {
    let locations = match tree {
        Some(tree) => finding
            .locations
            .iter()
            .filter_map(|span| DiagnosticLocation::in_tree(tree, *span))
            .collect(),
        None => Vec::new(),
    };
    Diagnostic {
        rule_id: entry.id().to_string(),
        message: entry.descriptor().format_message(&finding.args),
        severity: entry.severity(),
        locations,
        args: finding.args,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}

// ============================================================================
// Planning walk
// ============================================================================

struct Planner<'d, 'r, 't> {
    dispatcher: &'d Dispatcher<'r>,
    tree: &'t SyntaxTree,
    model: &'t dyn SemanticModel,
    filter: ExclusionFilter<'t>,
    seen: HashSet<crate::symbols::SymbolId>,
    invocations: Vec<Invocation<'t>>,
    cancelled: bool,
}

impl<'t> Planner<'_, '_, 't> {
    /// Symbols declared in several units fire in the unit of their first
    /// declaration.
    fn fires_here(&self, symbol: &Symbol) -> bool {
        match symbol.locations.first() {
            Some(loc) => loc.file == self.tree.path(),
            None => true,
        }
    }

    fn plan_symbol(&mut self, node: &NodeRef<'t>) {
        let model = self.model;
        let Some(symbol) = model.declared_symbol(self.tree, node) else {
            return;
        };
        if !self.fires_here(symbol) || !self.seen.insert(symbol.id) {
            return;
        }
        if self.filter.is_symbol_excluded(symbol) {
            return;
        }
        let registry = self.dispatcher.registry;
        for &rule in registry.symbol_rules(symbol.kind) {
            if self.dispatcher.selects(rule) {
                self.invocations.push(Invocation::Symbol {
                    rule,
                    node: node.clone(),
                    symbol,
                });
            }
        }
    }
}

impl<'t> Visitor<'t> for Planner<'_, '_, 't> {
    fn visit(&mut self, node: &NodeRef<'t>) -> VisitResult {
        if self.dispatcher.is_cancelled() {
            self.cancelled = true;
            return VisitResult::Stop;
        }
        if self.filter.opens_excluded_scope(self.tree, node) {
            debug!(kind = %node.kind(), span = %node.span(), "skipping excluded scope");
            return VisitResult::SkipChildren;
        }

        let registry = self.dispatcher.registry;
        for &rule in registry.node_rules(node.kind()) {
            if self.dispatcher.selects(rule) {
                self.invocations.push(Invocation::Node {
                    rule,
                    node: node.clone(),
                });
            }
        }
        if node.kind().declares_symbol() {
            self.plan_symbol(node);
        }
        VisitResult::Continue
    }
}
