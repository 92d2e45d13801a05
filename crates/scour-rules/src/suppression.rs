//! SC011: `SuppressMessage` attributes must say why.

use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::symbols::Symbol;
use scour_core::tree::query;
use scour_core::{NodeRef, Rule, Severity, SyntaxKind};

use crate::support::{at_name, attributes_named, name_text};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC011",
    title: "Suppressions need a justification",
    message_template: "The SuppressionMessage on '{0}' needs the Justification parameter filled out",
    category: Category::Documentation,
    severity: Severity::Warning,
    subscriptions: &[
        Subscription::Node(SyntaxKind::ClassDeclaration),
        Subscription::Node(SyntaxKind::StructDeclaration),
        Subscription::Node(SyntaxKind::InterfaceDeclaration),
        Subscription::Node(SyntaxKind::EnumDeclaration),
        Subscription::Node(SyntaxKind::MethodDeclaration),
        Subscription::Node(SyntaxKind::ConstructorDeclaration),
        Subscription::Node(SyntaxKind::PropertyDeclaration),
        Subscription::Node(SyntaxKind::FieldDeclaration),
    ],
    help_url: None,
};

const SUPPRESS_MESSAGE: &str = "SuppressMessage";
const JUSTIFICATION: &str = "Justification";

/// Placeholder text some tooling writes when generating a suppression.
pub const PENDING: &str = "<Pending>";

fn is_justified(text: &str) -> bool {
    !text.is_empty() && text != PENDING
}

pub struct SuppressionJustification;

impl Rule for SuppressionJustification {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let decl = &ctx.node;
        let written = attributes_named(decl, SUPPRESS_MESSAGE);
        let finding = |index: usize| match written.get(index) {
            Some(attribute) => Finding::at(attribute.span()),
            None => at_name(decl),
        };

        if let Some(symbol) = declared_symbol(ctx) {
            let findings = symbol
                .attributes
                .iter()
                .filter(|data| data.is(SUPPRESS_MESSAGE))
                .enumerate()
                .filter(|(_, data)| !data.named(JUSTIFICATION).is_some_and(is_justified))
                .map(|(index, _)| finding(index).arg(symbol.name.as_str()))
                .collect();
            return Ok(findings);
        }

        let name = name_text(decl).unwrap_or_default();
        let findings = written
            .iter()
            .enumerate()
            .filter(|(_, attribute)| !written_justification(attribute))
            .map(|(index, _)| finding(index).arg(name))
            .collect();
        Ok(findings)
    }
}

/// The symbol a declaration declares. Fields bind their first declarator.
fn declared_symbol<'a>(ctx: &NodeContext<'a>) -> Option<&'a Symbol> {
    if ctx.node.kind() != SyntaxKind::FieldDeclaration {
        return ctx.symbol();
    }
    let declarator = ctx
        .node
        .descendants_of_kind(SyntaxKind::VariableDeclarator)
        .into_iter()
        .next()?;
    let model = ctx.model;
    model.declared_symbol(ctx.tree, &declarator)
}

/// True if the attribute has a `Justification = ...` argument that is filled
/// in. Values other than string literals are taken as filled.
fn written_justification(attribute: &NodeRef<'_>) -> bool {
    query::attribute_arguments(attribute)
        .iter()
        .find(|(name, _)| *name == Some(JUSTIFICATION))
        .is_some_and(|(_, value)| match query::string_value(value) {
            Some(text) => is_justified(&text),
            None => true,
        })
}
