//! Shape queries over declaration and statement nodes.

use super::kinds::{SyntaxKind, TriviaKind};
use super::syntax::NodeRef;

/// Keywords that can appear as declaration modifiers.
pub const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "sealed", "abstract", "virtual",
    "override", "readonly", "partial", "extern", "unsafe", "new", "const", "volatile", "async",
];

/// Attribute lists applied directly to a declaration.
pub fn attribute_lists<'t>(decl: &NodeRef<'t>) -> Vec<NodeRef<'t>> {
    decl.children_of_kind(SyntaxKind::AttributeList)
}

/// Attributes inside one attribute list.
pub fn attributes<'t>(list: &NodeRef<'t>) -> Vec<NodeRef<'t>> {
    list.children_of_kind(SyntaxKind::Attribute)
}

/// Target of an attribute list, e.g. `assembly` in `[assembly: X]`.
pub fn attribute_target<'t>(list: &NodeRef<'t>) -> Option<&'t str> {
    let target = list.child_of_kind(SyntaxKind::AttributeTargetSpecifier)?;
    target.first_token()?.token_text()
}

/// Name of an attribute as written, e.g. `System.CodeDom.Compiler.GeneratedCode`.
pub fn attribute_name<'t>(attribute: &NodeRef<'t>) -> Option<&'t str> {
    attribute
        .child_nodes()
        .into_iter()
        .find(|c| {
            matches!(
                c.kind(),
                SyntaxKind::IdentifierName | SyntaxKind::QualifiedName | SyntaxKind::GenericName
            )
        })
        .map(|n| n.text())
}

/// Arguments of an attribute as `(name, value expression)`; `name` is set for
/// `Name = value` arguments.
pub fn attribute_arguments<'t>(attribute: &NodeRef<'t>) -> Vec<(Option<&'t str>, NodeRef<'t>)> {
    let Some(list) = attribute.child_of_kind(SyntaxKind::AttributeArgumentList) else {
        return Vec::new();
    };
    list.children_of_kind(SyntaxKind::AttributeArgument)
        .into_iter()
        .filter_map(|arg| {
            let name = arg
                .child_of_kind(SyntaxKind::NameEquals)
                .and_then(|ne| ne.first_token())
                .and_then(|t| t.token_text());
            let value = arg
                .child_nodes()
                .into_iter()
                .find(|c| c.kind() != SyntaxKind::NameEquals)?;
            Some((name, value))
        })
        .collect()
}

/// Value of a string literal expression with its quotes removed.
pub fn string_value(expr: &NodeRef<'_>) -> Option<String> {
    if expr.kind() != SyntaxKind::LiteralExpression {
        return None;
    }
    let token = expr.first_token()?;
    if token.kind() != SyntaxKind::StringLiteral {
        return None;
    }
    let text = token.token_text()?;
    let body = text.trim_start_matches('@').trim_start_matches('$');
    let inner = body.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.replace("\\\"", "\"").replace("\\\\", "\\"))
}

/// Modifier keywords of a declaration, in source order.
pub fn modifiers<'t>(decl: &NodeRef<'t>) -> Vec<&'t str> {
    decl.children()
        .into_iter()
        .filter(|c| c.kind() == SyntaxKind::Keyword)
        .filter_map(|c| c.token_text())
        .filter(|t| MODIFIERS.contains(t))
        .collect()
}

pub fn has_modifier(decl: &NodeRef<'_>, modifier: &str) -> bool {
    modifiers(decl).contains(&modifier)
}

/// True if a member declaration is private: either marked `private` (and not
/// `private protected`) or carrying no access modifier.
pub fn is_private(decl: &NodeRef<'_>) -> bool {
    let mods = modifiers(decl);
    let has = |m: &str| mods.contains(&m);
    if has("private") {
        return !has("protected");
    }
    !(has("public") || has("protected") || has("internal"))
}

/// Name token of a declaration.
pub fn declaration_name<'t>(decl: &NodeRef<'t>) -> Option<NodeRef<'t>> {
    match decl.kind() {
        SyntaxKind::FieldDeclaration => decl
            .descendants_of_kind(SyntaxKind::VariableDeclarator)
            .first()
            .and_then(|d| d.child_of_kind(SyntaxKind::Identifier)),
        _ => decl.child_of_kind(SyntaxKind::Identifier),
    }
}

/// The statement embedded in an `if`, `else` or loop.
pub fn embedded_statement<'t>(node: &NodeRef<'t>) -> Option<NodeRef<'t>> {
    if !node.kind().owns_embedded_statement() {
        return None;
    }
    // A do statement's body comes first; the others end with it.
    let statements = node
        .child_nodes()
        .into_iter()
        .filter(|c| c.kind().is_statement());
    match node.kind() {
        SyntaxKind::DoStatement => statements.into_iter().next(),
        _ => statements.last(),
    }
}

/// Text of the `///` doc comment leading a declaration, with the markers
/// stripped and lines joined by `\n`. `None` if there is no doc comment.
pub fn doc_comment(decl: &NodeRef<'_>) -> Option<String> {
    let lines: Vec<&str> = decl
        .leading_trivia()
        .iter()
        .filter(|t| t.kind == TriviaKind::DocComment)
        .map(|t| t.text.trim_start_matches("///"))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// True if any loop statement encloses `node`.
pub fn is_in_loop(node: &NodeRef<'_>) -> bool {
    node.ancestors().iter().any(|a| a.kind().is_loop())
}
