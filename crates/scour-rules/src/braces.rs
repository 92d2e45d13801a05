//! SC003: `if` and `else` bodies must be blocks.

use std::sync::Arc;

use scour_core::registry::{
    Category, Finding, NodeContext, RuleDescriptor, RuleFault, RuleOutcome, Subscription,
};
use scour_core::rewrite::{diagnostic_node, FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::tree::query::embedded_statement;
use scour_core::tree::{factory, GreenNode, Trivia, TriviaKind};
use scour_core::{NodeRef, Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC003",
    title: "If and else must have braces",
    message_template: "'{0}' statements must have braces",
    category: Category::Formatting,
    severity: Severity::Warning,
    subscriptions: &[
        Subscription::Node(SyntaxKind::IfStatement),
        Subscription::Node(SyntaxKind::ElseClause),
    ],
    help_url: None,
};

pub struct IfElseBraces;

impl Rule for IfElseBraces {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let node = &ctx.node;
        let statement = embedded_statement(node)
            .ok_or_else(|| RuleFault::shape(node, "no embedded statement"))?;
        let keyword = match node.kind() {
            SyntaxKind::IfStatement => "if",
            // `else if` chains are braced at the inner `if`.
            _ if statement.kind() == SyntaxKind::IfStatement => return Ok(Vec::new()),
            _ => "else",
        };
        if statement.kind() == SyntaxKind::Block {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::at(node.span()).arg(keyword)])
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

impl FixProvider for IfElseBraces {
    fn title(&self) -> &str {
        "Add braces"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        _model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let kind = match diagnostic.args.first().map(String::as_str) {
            Some("if") => SyntaxKind::IfStatement,
            Some("else") => SyntaxKind::ElseClause,
            other => {
                return Err(RewriteError::invalid_target(format!(
                    "expected 'if' or 'else', found {:?}",
                    other
                )))
            }
        };
        let owner = diagnostic_node(tree, diagnostic, kind)?;
        let statement = embedded_statement(&owner)
            .filter(|s| {
                s.kind() != SyntaxKind::Block
                    && !(kind == SyntaxKind::ElseClause && s.kind() == SyntaxKind::IfStatement)
            })
            .ok_or_else(|| RewriteError::invalid_target(format!("{} body is already braced", kind)))?;

        if statement.starts_line() {
            Ok(Patch::replace(&statement, wrap_lines(&statement), self.title()).reformatted())
        } else {
            Ok(Patch::replace(&statement, wrap_inline(&statement), self.title()))
        }
    }
}

/// `{ statement }` on the statement's own line.
fn wrap_inline(statement: &NodeRef<'_>) -> Arc<GreenNode> {
    let green = statement.green();
    let open = GreenNode::token(SyntaxKind::Punctuation, Vec::new(), "{", factory::space());
    let close = GreenNode::token(
        SyntaxKind::Punctuation,
        Vec::new(),
        "}",
        green.trailing_trivia().to_vec(),
    );
    let inner = green.with_trailing_trivia(factory::space());
    GreenNode::node(SyntaxKind::Block, vec![open, inner, close])
}

/// Braces on lines of their own around the statement. Indentation is left
/// to the reformatting pass.
fn wrap_lines(statement: &NodeRef<'_>) -> Arc<GreenNode> {
    let green = statement.green();
    let open = GreenNode::token(
        SyntaxKind::Punctuation,
        green.leading_trivia().to_vec(),
        "{",
        vec![Trivia::end_of_line()],
    );

    let mut trailing = green.trailing_trivia().to_vec();
    let ended_line = trailing.last().is_some_and(|t| t.kind == TriviaKind::EndOfLine);
    if !ended_line {
        trailing.push(Trivia::end_of_line());
    }
    let inner = green.with_trailing_trivia(trailing);

    let close_trailing = if ended_line {
        vec![Trivia::end_of_line()]
    } else {
        Vec::new()
    };
    let close = GreenNode::token(SyntaxKind::Punctuation, Vec::new(), "}", close_trailing);
    GreenNode::node(SyntaxKind::Block, vec![open, inner, close])
}
