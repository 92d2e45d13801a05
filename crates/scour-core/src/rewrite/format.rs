//! Indentation renormalization for fix replacements.
//!
//! A replacement built from fragments carries whatever indentation its
//! pieces had in their old positions. [`reindent`] rewrites the whitespace
//! that opens each line of the replacement so that it sits at the depth its
//! new parent implies.

use std::sync::Arc;

use crate::text::detect_indentation;
use crate::tree::{GreenNode, NodeRef, SyntaxKind, Trivia, TriviaKind};

/// Reindent `replacement`, which is about to take the place of `target`.
///
/// The base indentation is the indentation of the line holding the target's
/// parent. Only whitespace at the start of a line is touched; the text of
/// tokens and comments is never changed.
pub fn reindent(target: &NodeRef<'_>, replacement: &Arc<GreenNode>, unit: &str) -> Arc<GreenNode> {
    let parent = target.parent();
    let anchor = match &parent {
        Some(parent) => parent.span().start,
        None => target.span().start,
    };
    let base = detect_indentation(target.tree().text(), anchor);

    let mut depth = 0;
    if let Some(parent) = &parent {
        if nests_statement(parent.kind(), replacement.kind()) {
            depth += 1;
        }
        if parent.kind().has_brace_body() && !is_brace(replacement) {
            depth += 1;
        }
    }

    let line_open = match target.previous_token() {
        Some(prev) => ends_line(prev.trailing_trivia()),
        None => true,
    };
    let mut indenter = Indenter {
        base,
        unit,
        line_open,
    };
    indenter.visit(replacement, depth)
}

struct Indenter<'a> {
    base: &'a str,
    unit: &'a str,
    /// The previous token's trailing trivia ended a line.
    line_open: bool,
}

impl Indenter<'_> {
    fn visit(&mut self, node: &Arc<GreenNode>, depth: usize) -> Arc<GreenNode> {
        if let Some((leading, text, trailing)) = node.token_parts() {
            let breaks = self.line_open || leading.iter().any(is_line_break);
            let leading = if breaks {
                self.indent_leading(leading, depth)
            } else {
                leading.to_vec()
            };
            self.line_open = ends_line(trailing);
            return GreenNode::token(node.kind(), leading, text, trailing.to_vec());
        }

        let kind = node.kind();
        let braced = kind.has_brace_body();
        let mut inside = false;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let mut child_depth = depth;
            if braced {
                match child.token_text() {
                    Some("{") => inside = true,
                    Some("}") => inside = false,
                    _ if inside => child_depth += 1,
                    _ => {}
                }
            }
            if nests_statement(kind, child.kind()) {
                child_depth += 1;
            }
            children.push(self.visit(child, child_depth));
        }
        GreenNode::node(kind, children)
    }

    fn indent_leading(&self, leading: &[Trivia], depth: usize) -> Vec<Trivia> {
        let indent = self.indent(depth);
        let mut out = Vec::with_capacity(leading.len() + 1);
        let mut at_line_start = self.line_open;
        for piece in leading {
            match piece.kind {
                TriviaKind::Whitespace if at_line_start => {}
                TriviaKind::EndOfLine => {
                    out.push(piece.clone());
                    at_line_start = true;
                }
                _ => {
                    if at_line_start && !indent.is_empty() {
                        out.push(Trivia::whitespace(indent.clone()));
                    }
                    out.push(piece.clone());
                    at_line_start = false;
                }
            }
        }
        if at_line_start && !indent.is_empty() {
            out.push(Trivia::whitespace(indent));
        }
        out
    }

    fn indent(&self, depth: usize) -> String {
        let mut indent = self.base.to_string();
        for _ in 0..depth {
            indent.push_str(self.unit);
        }
        indent
    }
}

/// A non-block statement embedded in `parent` sits one level deeper.
/// `else if` chains stay at the depth of the `else`.
fn nests_statement(parent: SyntaxKind, child: SyntaxKind) -> bool {
    parent.owns_embedded_statement()
        && child.is_statement()
        && child != SyntaxKind::Block
        && !(parent == SyntaxKind::ElseClause && child == SyntaxKind::IfStatement)
}

fn is_brace(node: &GreenNode) -> bool {
    matches!(node.token_text(), Some("{") | Some("}"))
}

fn is_line_break(piece: &Trivia) -> bool {
    piece.kind == TriviaKind::EndOfLine
}

fn ends_line(trailing: &[Trivia]) -> bool {
    trailing.last().is_some_and(is_line_break)
}
