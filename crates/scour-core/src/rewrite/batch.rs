//! Many patches at once: conflict-free batches and the fix-all loop.

use std::sync::Arc;

use tracing::{debug, info_span, warn};

use super::{apply_with, prepare, replace_at, Patch, RewriteError, RewriteOptions};
use crate::config::ScourSettings;
use crate::dispatch::Dispatcher;
use crate::error::ScourError;
use crate::registry::Registry;
use crate::sink::Diagnostic;
use crate::symbols::SemanticModel;
use crate::tree::{GreenNode, SyntaxTree};
use crate::types::SpanEdit;

/// Fix-all settings.
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Upper bound on analysis rounds.
    pub max_rounds: usize,
    pub rewrite: RewriteOptions,
}

impl Default for FixOptions {
    fn default() -> Self {
        FixOptions {
            max_rounds: 8,
            rewrite: RewriteOptions::default(),
        }
    }
}

impl FixOptions {
    pub fn from_settings(settings: &ScourSettings) -> Self {
        FixOptions {
            max_rounds: settings.max_fix_rounds,
            rewrite: RewriteOptions {
                indent_unit: settings.indent_unit.clone(),
            },
        }
    }
}

/// Result of [`apply_batch`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub tree: SyntaxTree,
    pub applied: usize,
    /// Patches that overlapped an accepted one, in start order.
    pub deferred: Vec<Patch>,
    /// Patches whose target no longer matched the snapshot.
    pub invalid: usize,
    /// What the accepted patches did to the text, sorted by start.
    pub edits: Vec<SpanEdit>,
}

/// Apply every patch that does not overlap an earlier one.
///
/// Patches are ordered by the start of their target's full span. A patch is
/// accepted when it starts at or after the end of everything accepted so
/// far; the others are deferred to a later round. All accepted patches are
/// computed against `tree` itself.
pub fn apply_batch(tree: &SyntaxTree, mut patches: Vec<Patch>, options: &RewriteOptions) -> BatchOutcome {
    patches.sort_by_key(|p| (p.target_span.start, p.target_span.end));

    let mut accepted: Vec<(Patch, Arc<GreenNode>)> = Vec::new();
    let mut deferred = Vec::new();
    let mut invalid = 0;
    let mut frontier = 0;

    for patch in patches {
        if !accepted.is_empty() && patch.target_span.start < frontier {
            debug!(title = %patch.title, span = %patch.target_span, "patch overlaps an accepted one, deferring");
            deferred.push(patch);
            continue;
        }
        match prepare(tree, &patch, options) {
            Ok(green) => {
                frontier = frontier.max(patch.target_span.end);
                accepted.push((patch, green));
            }
            Err(err) => {
                warn!(file = tree.path(), title = %patch.title, %err, "dropping patch");
                invalid += 1;
            }
        }
    }

    let mut root = Arc::clone(tree.green());
    let mut edits = Vec::with_capacity(accepted.len());
    for (patch, green) in &accepted {
        edits.push(SpanEdit {
            old: patch.target_span,
            new_len: green.width(),
        });
        root = replace_at(&root, patch.target.indices(), Arc::clone(green));
    }

    BatchOutcome {
        tree: SyntaxTree::new(tree.path(), root),
        applied: accepted.len(),
        deferred,
        invalid,
        edits,
    }
}

/// Result of [`fix_all`].
#[derive(Debug)]
pub struct FixAllReport {
    pub tree: SyntaxTree,
    /// Rounds that applied or attempted patches.
    pub rounds: usize,
    pub applied: usize,
    /// Patches still deferred when the loop stopped.
    pub deferred: usize,
    /// Text edits of each applied round, in order. Replaying them through
    /// [`SemanticModel::rebase`] maps the input's bindings onto `tree`.
    pub edits: Vec<Vec<SpanEdit>>,
}

/// Fix every diagnostic of `rule_id` in `tree`.
///
/// Each round re-analyzes the current snapshot, computes all patches in
/// parallel and applies a conflict-free batch. The loop stops when a round
/// leaves nothing deferred, when nothing more applies, or after
/// `options.max_rounds`. The semantic model is rebased onto each new
/// snapshot before the next round.
pub fn fix_all(
    tree: &SyntaxTree,
    model: &dyn SemanticModel,
    dispatcher: &Dispatcher<'_>,
    rule_id: &str,
    options: &FixOptions,
) -> Result<FixAllReport, ScourError> {
    let _span = info_span!("fix_all", file = tree.path(), rule = rule_id).entered();

    let dispatcher = dispatcher.only(rule_id)?;
    let entry = dispatcher
        .registry()
        .get(rule_id)
        .ok_or_else(|| ScourError::UnknownRule {
            id: rule_id.to_string(),
        })?;
    let provider = entry.rule().fix().ok_or_else(|| RewriteError::NoFix {
        rule: rule_id.to_string(),
    })?;

    let mut current = tree.clone();
    let mut rebased: Option<Box<dyn SemanticModel>> = None;
    let mut rounds = 0;
    let mut applied = 0;
    let mut deferred = 0;
    let mut edits = Vec::new();

    for round in 1..=options.max_rounds {
        let round_model: &dyn SemanticModel = match &rebased {
            Some(m) => m.as_ref(),
            None => model,
        };
        let diagnostics = dispatcher.run(&current, round_model)?;
        if diagnostics.is_empty() {
            break;
        }
        let patches = provider.compute_all(&current, round_model, &diagnostics);
        if patches.is_empty() {
            break;
        }

        rounds = round;
        let outcome = apply_batch(&current, patches, &options.rewrite);
        debug!(
            round,
            applied = outcome.applied,
            deferred = outcome.deferred.len(),
            invalid = outcome.invalid,
            "fix round"
        );
        applied += outcome.applied;
        deferred = outcome.deferred.len();
        if outcome.applied == 0 {
            break;
        }

        let next_model = round_model.rebase(current.path(), &outcome.edits);
        rebased = Some(next_model);
        edits.push(outcome.edits);
        current = outcome.tree;
        if deferred == 0 {
            break;
        }
    }

    if deferred > 0 {
        warn!(deferred, rounds, "fix-all stopped with patches still deferred");
    }

    Ok(FixAllReport {
        tree: current,
        rounds,
        applied,
        deferred,
        edits,
    })
}

/// Apply the fix for one diagnostic.
pub fn fix_one(
    tree: &SyntaxTree,
    model: &dyn SemanticModel,
    registry: &Registry,
    diagnostic: &Diagnostic,
    options: &FixOptions,
) -> Result<SyntaxTree, ScourError> {
    let entry = registry
        .get(&diagnostic.rule_id)
        .ok_or_else(|| ScourError::UnknownRule {
            id: diagnostic.rule_id.clone(),
        })?;
    let provider = entry.rule().fix().ok_or_else(|| RewriteError::NoFix {
        rule: diagnostic.rule_id.clone(),
    })?;
    let patch = provider.compute(tree, model, diagnostic)?;
    Ok(apply_with(tree, &patch, &options.rewrite)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Category, Finding, NodeContext, Rule, RuleDescriptor, RuleOutcome, Subscription};
    use crate::rewrite::{diagnostic_node, FixProvider};
    use crate::symbols::Unbound;
    use crate::tree::notation::parse_tree;
    use crate::tree::{factory, NodePath, SyntaxKind};
    use crate::types::{Severity, Span};
    use pretty_assertions::assert_eq;

    /// Reports every parenthesized expression and fixes it by dropping the
    /// parentheses.
    struct Unwrap {
        descriptor: RuleDescriptor,
    }

    const PARENS: &[Subscription] = &[Subscription::Node(SyntaxKind::ParenthesizedExpression)];

    impl Unwrap {
        fn new() -> Self {
            Unwrap {
                descriptor: RuleDescriptor {
                    id: "T001",
                    title: "Redundant parentheses",
                    message_template: "redundant parentheses",
                    category: Category::Design,
                    severity: Severity::Warning,
                    subscriptions: PARENS,
                    help_url: None,
                },
            }
        }
    }

    impl Rule for Unwrap {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.descriptor
        }

        fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
            Ok(vec![Finding::at(ctx.node.span())])
        }

        fn fix(&self) -> Option<&dyn FixProvider> {
            Some(self)
        }
    }

    impl FixProvider for Unwrap {
        fn title(&self) -> &str {
            "Remove parentheses"
        }

        fn compute(
            &self,
            tree: &SyntaxTree,
            _model: &dyn SemanticModel,
            diagnostic: &Diagnostic,
        ) -> Result<Patch, RewriteError> {
            let node = diagnostic_node(tree, diagnostic, SyntaxKind::ParenthesizedExpression)?;
            let inner = node
                .child_nodes()
                .into_iter()
                .next()
                .ok_or_else(|| RewriteError::invalid_target("empty parentheses"))?;
            let replacement = factory::with_trivia_of(inner.green(), node.green());
            Ok(Patch::replace(&node, replacement, self.title()))
        }
    }

    fn registry() -> Registry {
        Registry::builder().register(Unwrap::new()).build().unwrap()
    }

    const NESTED: &str = r#"
        (block "{" "\n"
          (expression_statement
            (parenthesized_expression "(" (parenthesized_expression "(" (identifier_name "a") ")") ")") ";" "\n")
          (expression_statement
            (parenthesized_expression "(" (identifier_name "b") ")") ";" "\n")
          "}")
    "#;

    mod batches {
        use super::*;
        use pretty_assertions::assert_eq;

        fn patch_for(tree: &SyntaxTree, index: usize) -> Patch {
            let node = tree.root().descendants_of_kind(SyntaxKind::ParenthesizedExpression)[index].clone();
            let inner = node.child_nodes()[0].clone();
            Patch::replace(&node, Arc::clone(inner.green()), "unwrap")
        }

        #[test]
        fn overlapping_patch_is_deferred() {
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let patches = vec![patch_for(&tree, 1), patch_for(&tree, 0), patch_for(&tree, 2)];
            let outcome = apply_batch(&tree, patches, &RewriteOptions::default());
            assert_eq!(outcome.applied, 2);
            assert_eq!(outcome.deferred.len(), 1);
            assert_eq!(outcome.deferred[0].target_span, Span::new(3, 6));
            assert_eq!(outcome.tree.text(), "{\n(a);\nb;\n}");
            assert_eq!(
                outcome.edits,
                vec![
                    SpanEdit { old: Span::new(2, 7), new_len: 3 },
                    SpanEdit { old: Span::new(9, 12), new_len: 1 },
                ]
            );
        }

        #[test]
        fn invalid_target_is_dropped() {
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let mut stale = patch_for(&tree, 2);
            stale.target = NodePath::from(vec![0]);
            let outcome = apply_batch(&tree, vec![stale, patch_for(&tree, 0)], &RewriteOptions::default());
            assert_eq!(outcome.applied, 1);
            assert_eq!(outcome.invalid, 1);
            assert_eq!(outcome.tree.text(), "{\n(a);\n(b);\n}");
        }

        #[test]
        fn empty_batch_returns_the_same_text() {
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let outcome = apply_batch(&tree, Vec::new(), &RewriteOptions::default());
            assert_eq!(outcome.applied, 0);
            assert_eq!(outcome.tree.text(), tree.text());
            assert!(outcome.edits.is_empty());
        }
    }

    mod fix_all_loop {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn nested_fixes_take_two_rounds() {
            let registry = registry();
            let dispatcher = Dispatcher::new(&registry);
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let report = fix_all(&tree, &Unbound, &dispatcher, "T001", &FixOptions::default()).unwrap();
            assert_eq!(report.tree.text(), "{\na;\nb;\n}");
            assert_eq!(report.rounds, 2);
            assert_eq!(report.applied, 3);
            assert_eq!(report.deferred, 0);
            assert_eq!(report.edits.len(), 2);
            assert_eq!(report.edits[1], vec![SpanEdit { old: Span::new(2, 5), new_len: 1 }]);
        }

        #[test]
        fn fixed_output_is_a_fixed_point() {
            let registry = registry();
            let dispatcher = Dispatcher::new(&registry);
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let once = fix_all(&tree, &Unbound, &dispatcher, "T001", &FixOptions::default()).unwrap();
            let twice = fix_all(&once.tree, &Unbound, &dispatcher, "T001", &FixOptions::default()).unwrap();
            assert_eq!(twice.applied, 0);
            assert_eq!(twice.rounds, 0);
            assert_eq!(twice.tree.text(), once.tree.text());
        }

        #[test]
        fn round_limit_stops_the_loop() {
            let registry = registry();
            let dispatcher = Dispatcher::new(&registry);
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let options = FixOptions {
                max_rounds: 1,
                ..FixOptions::default()
            };
            let report = fix_all(&tree, &Unbound, &dispatcher, "T001", &options).unwrap();
            assert_eq!(report.rounds, 1);
            assert_eq!(report.deferred, 1);
            assert_eq!(report.tree.text(), "{\n(a);\nb;\n}");
        }

        #[test]
        fn unknown_rule_is_an_error() {
            let registry = registry();
            let dispatcher = Dispatcher::new(&registry);
            let tree = parse_tree("a.cs", NESTED).unwrap();
            let err = fix_all(&tree, &Unbound, &dispatcher, "T999", &FixOptions::default()).unwrap_err();
            assert!(matches!(err, ScourError::UnknownRule { .. }));
        }
    }

    #[test]
    fn fix_one_applies_a_single_diagnostic() {
        let registry = registry();
        let tree = parse_tree("a.cs", NESTED).unwrap();
        let diagnostics = Dispatcher::new(&registry).run(&tree, &Unbound).unwrap();
        assert_eq!(diagnostics.len(), 3);
        let last = diagnostics.last().unwrap();
        let fixed = fix_one(&tree, &Unbound, &registry, last, &FixOptions::default()).unwrap();
        assert_eq!(fixed.text(), "{\n((a));\nb;\n}");
    }
}
