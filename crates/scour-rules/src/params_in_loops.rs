//! SC005: calls that allocate a `params` array on every loop iteration.

use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::tree::query::is_in_loop;
use scour_core::{Rule, Severity, SyntaxKind};

use crate::support::invoked_method;

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC005",
    title: "Avoid calling params methods in loops",
    message_template: "Call to a method using a param array as arguments '{0}' in a loop",
    category: Category::Performance,
    severity: Severity::Info,
    subscriptions: &[Subscription::Node(SyntaxKind::InvocationExpression)],
    help_url: None,
};

/// Needs a bound method; unresolved calls are never reported.
pub struct ParamsInLoops;

impl Rule for ParamsInLoops {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let Some(method) = invoked_method(ctx) else {
            return Ok(Vec::new());
        };
        if !method.takes_params_array() || !is_in_loop(&ctx.node) {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::at(ctx.node.span()).arg(ctx.node.text())])
    }
}
