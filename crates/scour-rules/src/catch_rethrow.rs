//! SC014: catch blocks must end by throwing.

use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleFault, RuleOutcome, Subscription};
use scour_core::{Rule, Severity, SyntaxKind};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC014",
    title: "Catch blocks should rethrow",
    message_template: "Catch blocks should rethrow or throw",
    category: Category::Design,
    severity: Severity::Info,
    subscriptions: &[Subscription::Node(SyntaxKind::CatchClause)],
    help_url: None,
};

/// A catch body passes only if its last statement is a `throw` and it holds
/// no `return` anywhere. Without flow analysis this also reports bodies
/// whose end is unreachable for other reasons.
pub struct CatchRethrow;

impl Rule for CatchRethrow {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let catch = &ctx.node;
        let body = catch
            .child_of_kind(SyntaxKind::Block)
            .ok_or_else(|| RuleFault::shape(catch, "catch clause has no block"))?;

        let returns = !body.descendants_of_kind(SyntaxKind::ReturnStatement).is_empty();
        let ends_in_throw = body
            .child_nodes()
            .pop()
            .is_some_and(|last| last.kind() == SyntaxKind::ThrowStatement);
        if ends_in_throw && !returns {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::at(catch.span())])
    }
}
