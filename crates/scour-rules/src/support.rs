//! Helpers shared by several rules.

use scour_core::registry::{Finding, NodeContext};
use scour_core::rewrite::{diagnostic_node, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::symbols::{Symbol, SymbolKind};
use scour_core::tree::query;
use scour_core::{NodeRef, SyntaxKind, SyntaxTree};

/// A finding at the name token of a declaration, or at the whole
/// declaration when it has none.
pub(crate) fn at_name(decl: &NodeRef<'_>) -> Finding {
    match query::declaration_name(decl) {
        Some(name) => Finding::at(name.span()),
        None => Finding::at(decl.span()),
    }
}

/// Declaration name as written.
pub(crate) fn name_text<'t>(decl: &NodeRef<'t>) -> Option<&'t str> {
    query::declaration_name(decl).and_then(|name| name.token_text())
}

/// The declaration of `kind` whose name token sits at the diagnostic's
/// primary location.
pub(crate) fn named_declaration<'t>(
    tree: &'t SyntaxTree,
    diagnostic: &Diagnostic,
    kind: SyntaxKind,
) -> Result<NodeRef<'t>, RewriteError> {
    let name = diagnostic_node(tree, diagnostic, SyntaxKind::Identifier)?;
    name.parent()
        .filter(|parent| parent.kind() == kind)
        .ok_or_else(|| {
            RewriteError::invalid_target(format!("'{}' is not the name of a {}", name.text(), kind))
        })
}

/// The method an invocation calls. Hosts bind either the invocation, its
/// callee expression or the name at the end of the callee.
pub(crate) fn invoked_method<'a>(ctx: &NodeContext<'a>) -> Option<&'a Symbol> {
    let callee = ctx.node.child_nodes().into_iter().next()?;
    let name = match callee.kind() {
        SyntaxKind::MemberAccessExpression => callee.child_nodes().pop(),
        _ => None,
    };
    ctx.resolve(&ctx.node)
        .or_else(|| ctx.resolve(&callee))
        .or_else(|| name.and_then(|n| ctx.resolve(&n)))
        .filter(|symbol| symbol.kind == SymbolKind::Method)
}

/// True if an attribute name as written is `name` or `nameAttribute`, with
/// or without a namespace.
pub(crate) fn attribute_is(written: &str, name: &str) -> bool {
    let simple = written.rsplit('.').next().unwrap_or(written).trim();
    simple == name || simple.strip_suffix("Attribute") == Some(name)
}

/// Attributes on a declaration whose name matches `name`.
pub(crate) fn attributes_named<'t>(decl: &NodeRef<'t>, name: &str) -> Vec<NodeRef<'t>> {
    query::attribute_lists(decl)
        .iter()
        .flat_map(query::attributes)
        .filter(|attribute| query::attribute_name(attribute).is_some_and(|n| attribute_is(n, name)))
        .collect()
}
