//! SC004: spell built-in types by their framework names.

use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::rewrite::{diagnostic_node, FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::tree::factory;
use scour_core::{NodeRef, Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC004",
    title: "Avoid predefined type keywords",
    message_template: "Convert '{0}' to the explicit type '{1}'",
    category: Category::Usage,
    severity: Severity::Warning,
    subscriptions: &[Subscription::Node(SyntaxKind::PredefinedType)],
    help_url: None,
};

/// Keyword to framework type name. `void` has no counterpart.
pub const TYPE_NAMES: &[(&str, &str)] = &[
    ("bool", "Boolean"),
    ("byte", "Byte"),
    ("char", "Char"),
    ("decimal", "Decimal"),
    ("double", "Double"),
    ("float", "Single"),
    ("int", "Int32"),
    ("long", "Int64"),
    ("object", "Object"),
    ("sbyte", "SByte"),
    ("short", "Int16"),
    ("string", "String"),
    ("uint", "UInt32"),
    ("ulong", "UInt64"),
    ("ushort", "UInt16"),
];

/// Framework name for a type keyword.
pub fn framework_name(keyword: &str) -> Option<&'static str> {
    TYPE_NAMES
        .iter()
        .find(|(k, _)| *k == keyword)
        .map(|(_, name)| *name)
}

fn keyword<'t>(node: &NodeRef<'t>) -> Option<&'t str> {
    node.first_token().and_then(|t| t.token_text())
}

pub struct PredefinedTypes;

impl Rule for PredefinedTypes {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let Some(keyword) = keyword(&ctx.node) else {
            return Ok(Vec::new());
        };
        Ok(framework_name(keyword)
            .map(|name| Finding::at(ctx.node.span()).arg(keyword).arg(name))
            .into_iter()
            .collect())
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

impl FixProvider for PredefinedTypes {
    fn title(&self) -> &str {
        "Use the explicit type name"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        _model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let node = diagnostic_node(tree, diagnostic, SyntaxKind::PredefinedType)?;
        let written = keyword(&node).unwrap_or_default();
        let name = framework_name(written).ok_or_else(|| {
            RewriteError::invalid_target(format!("'{}' has no framework name", written))
        })?;
        let replacement = factory::with_trivia_of(&factory::identifier_name(name), node.green());
        Ok(Patch::replace(&node, replacement, format!("Use '{}'", name)))
    }
}
