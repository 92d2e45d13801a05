//! SC002: `Debug.Assert` calls must carry a message.

use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::rewrite::{diagnostic_node, FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::tree::{factory, GreenNode};
use scour_core::{NodeRef, Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

use crate::support::invoked_method;

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC002",
    title: "Call assert methods with a message",
    message_template: "Never use the single parameter Debug.Assert",
    category: Category::Usage,
    severity: Severity::Error,
    subscriptions: &[Subscription::Node(SyntaxKind::InvocationExpression)],
    help_url: None,
};

const CALLEES: &[&str] = &["Debug.Assert", "System.Diagnostics.Debug.Assert"];
const DEBUG_TYPES: &[&str] = &["Debug", "System.Diagnostics.Debug"];

fn arguments<'t>(invocation: &NodeRef<'t>) -> Option<(NodeRef<'t>, Vec<NodeRef<'t>>)> {
    let list = invocation.child_of_kind(SyntaxKind::ArgumentList)?;
    let args = list.children_of_kind(SyntaxKind::Argument);
    Some((list, args))
}

pub struct AssertMessage;

impl Rule for AssertMessage {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let node = &ctx.node;
        let Some(callee) = node.child_nodes().into_iter().next() else {
            return Ok(Vec::new());
        };
        if !CALLEES.contains(&callee.text()) {
            return Ok(Vec::new());
        }

        // Unbound calls are assumed to be the real Debug.Assert.
        if let Some(method) = invoked_method(ctx) {
            let declared_in_debug = ctx
                .model
                .containing_type(method)
                .map(|ty| DEBUG_TYPES.contains(&ty.name.as_str()));
            if declared_in_debug == Some(false) {
                return Ok(Vec::new());
            }
        }

        let count = arguments(node).map(|(_, args)| args.len()).unwrap_or(0);
        if count > 1 {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::at(node.span())])
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

impl FixProvider for AssertMessage {
    fn title(&self) -> &str {
        "Add a message parameter"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        _model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let invocation = diagnostic_node(tree, diagnostic, SyntaxKind::InvocationExpression)?;
        let (list, args) = arguments(&invocation)
            .ok_or_else(|| RewriteError::invalid_target("assert call has no argument list"))?;
        let [condition] = args.as_slice() else {
            return Err(RewriteError::invalid_target(format!(
                "expected one argument, found {}",
                args.len()
            )));
        };

        let children = list.green().children();
        let close = children
            .iter()
            .rposition(|c| c.token_text() == Some(")"))
            .ok_or_else(|| RewriteError::invalid_target("argument list is not closed"))?;
        let comma = GreenNode::token(SyntaxKind::Punctuation, Vec::new(), ",", factory::space());
        let message = GreenNode::node(
            SyntaxKind::Argument,
            vec![factory::string_literal(condition.text())],
        );
        let replacement = list
            .green()
            .with_inserted_child(close, message)
            .with_inserted_child(close, comma);
        Ok(Patch::replace(&list, replacement, self.title()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tree, Harness, FILE};
    use pretty_assertions::assert_eq;
    use scour_core::symbols::{Symbol, SymbolId, SymbolKind, SymbolTable};
    use scour_core::Unbound;

    fn assert_call(args: &str) -> String {
        format!(
            r#"(expression_statement
                 (invocation_expression
                   (member_access_expression (identifier_name "Debug") "." (identifier_name "Assert"))
                   (argument_list "(" {} ")"))
                 ";")"#,
            args
        )
    }

    const ONE_ARG: &str = r#"(argument (binary_expression (identifier_name "count ") "> " (literal_expression "0")))"#;

    #[test]
    fn single_argument_assert_is_reported() {
        let tree = tree(&assert_call(ONE_ARG));
        let diagnostics = Harness::new(AssertMessage).check(&tree, &Unbound);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Never use the single parameter Debug.Assert"
        );
    }

    #[test]
    fn assert_with_message_is_clean() {
        let tree = tree(&assert_call(
            r#"(argument (identifier_name "ok")) ", " (argument (literal_expression "\"ok\""))"#,
        ));
        assert!(Harness::new(AssertMessage).check(&tree, &Unbound).is_empty());
    }

    #[test]
    fn assert_bound_to_another_type_is_clean() {
        let tree = tree(&assert_call(ONE_ARG));
        let name = tree.root().descendants_of_kind(SyntaxKind::IdentifierName)[1].clone();
        assert_eq!(name.text(), "Assert");

        let mut method = Symbol::new(2, SymbolKind::Method, "Assert");
        method.containing_type = Some(SymbolId(1));
        let table = SymbolTable::builder()
            .symbol(Symbol::new(1, SymbolKind::NamedType, "Contracts.Debug"))
            .symbol(method)
            .bind(FILE, name.span(), SymbolId(2))
            .build()
            .unwrap();
        assert!(Harness::new(AssertMessage).check(&tree, &table).is_empty());
    }

    #[test]
    fn fix_appends_the_condition_as_message() {
        let tree = tree(&assert_call(ONE_ARG));
        let harness = Harness::new(AssertMessage);
        let diagnostics = harness.check(&tree, &Unbound);
        let fixed = harness.fix(&tree, &Unbound, &diagnostics[0]);
        assert_eq!(fixed.text(), r#"Debug.Assert(count > 0, "count > 0");"#);
        assert!(harness.check(&fixed, &Unbound).is_empty());
    }

    #[test]
    fn empty_assert_has_no_fix() {
        let tree = tree(&assert_call(""));
        let harness = Harness::new(AssertMessage);
        let diagnostics = harness.check(&tree, &Unbound);
        assert_eq!(diagnostics.len(), 1);
        assert!(harness.try_fix(&tree, &Unbound, &diagnostics[0]).is_err());
    }
}
