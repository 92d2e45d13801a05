//! Constructors for the small subtrees fix providers build.

use std::sync::Arc;

use super::green::{GreenNode, Trivia};
use super::kinds::SyntaxKind;

/// A token without trivia.
pub fn token(kind: SyntaxKind, text: impl Into<String>) -> Arc<GreenNode> {
    GreenNode::token(kind, Vec::new(), text, Vec::new())
}

pub fn keyword(text: &str) -> Arc<GreenNode> {
    token(SyntaxKind::Keyword, text)
}

pub fn identifier(text: &str) -> Arc<GreenNode> {
    token(SyntaxKind::Identifier, text)
}

pub fn punct(text: &str) -> Arc<GreenNode> {
    token(SyntaxKind::Punctuation, text)
}

/// A single space of trivia.
pub fn space() -> Vec<Trivia> {
    vec![Trivia::whitespace(" ")]
}

/// `(identifier_name <text>)`.
pub fn identifier_name(text: &str) -> Arc<GreenNode> {
    GreenNode::node(SyntaxKind::IdentifierName, vec![identifier(text)])
}

/// Dotted name, left-nested: `A.B.C` is `(qualified_name (qualified_name A . B) . C)`.
pub fn qualified_name(dotted: &str) -> Arc<GreenNode> {
    let mut parts = dotted.split('.');
    let first = identifier_name(parts.next().unwrap_or_default());
    parts.fold(first, |left, part| {
        GreenNode::node(
            SyntaxKind::QualifiedName,
            vec![left, punct("."), identifier_name(part)],
        )
    })
}

/// Quote `value` as a regular string literal.
pub fn string_literal(value: &str) -> Arc<GreenNode> {
    let mut text = String::with_capacity(value.len() + 2);
    text.push('"');
    for c in value.chars() {
        match c {
            '"' => text.push_str("\\\""),
            '\\' => text.push_str("\\\\"),
            '\n' => text.push_str("\\n"),
            '\r' => text.push_str("\\r"),
            '\t' => text.push_str("\\t"),
            other => text.push(other),
        }
    }
    text.push('"');
    GreenNode::node(
        SyntaxKind::LiteralExpression,
        vec![token(SyntaxKind::StringLiteral, text)],
    )
}

/// Copy of `node` with the outer trivia of `from`.
pub fn with_trivia_of(node: &GreenNode, from: &GreenNode) -> Arc<GreenNode> {
    node.with_leading_trivia(from.leading_trivia().to_vec())
        .with_trailing_trivia(from.trailing_trivia().to_vec())
}

/// Copy of `node` with no outer trivia.
pub fn without_trivia(node: &GreenNode) -> Arc<GreenNode> {
    node.with_leading_trivia(Vec::new())
        .with_trailing_trivia(Vec::new())
}
