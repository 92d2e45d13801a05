//! Event-driven tree construction.
//!
//! Producers emit `start_node` / `token` / `trivia` / `finish_node` events in
//! source order. Trivia is buffered and attached to tokens as the next token
//! arrives, so producers never decide ownership themselves.

use std::sync::Arc;

use super::green::{GreenNode, Trivia};
use super::kinds::SyntaxKind;
use super::trivia::split_at_line_end;
use super::TreeError;

#[derive(Debug)]
struct RawToken {
    kind: SyntaxKind,
    text: String,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
}

#[derive(Debug)]
enum RawElement {
    Token(usize),
    Node(SyntaxKind, Vec<RawElement>),
}

/// Builds a green tree from a flat stream of events.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tokens: Vec<RawToken>,
    stack: Vec<(SyntaxKind, Vec<RawElement>)>,
    pending: Vec<Trivia>,
    root: Option<RawElement>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an interior node.
    pub fn start_node(&mut self, kind: SyntaxKind) -> Result<(), TreeError> {
        if kind.is_token() {
            return Err(TreeError::KindMismatch {
                expected: "node kind".to_string(),
                found: kind.to_string(),
            });
        }
        if self.root.is_some() {
            return Err(TreeError::Unbalanced {
                message: format!("{} started after the root was finished", kind),
            });
        }
        self.stack.push((kind, Vec::new()));
        Ok(())
    }

    /// Add a token to the open node.
    pub fn token(&mut self, kind: SyntaxKind, text: impl Into<String>) -> Result<(), TreeError> {
        if !kind.is_token() {
            return Err(TreeError::KindMismatch {
                expected: "token kind".to_string(),
                found: kind.to_string(),
            });
        }
        let Some((_, children)) = self.stack.last_mut() else {
            return Err(TreeError::Unbalanced {
                message: format!("{} token outside any node", kind),
            });
        };

        let gap = std::mem::take(&mut self.pending);
        let leading = match self.tokens.last_mut() {
            Some(prev) => {
                let (trailing, leading) = split_at_line_end(gap);
                prev.trailing.extend(trailing);
                leading
            }
            None => gap,
        };

        children.push(RawElement::Token(self.tokens.len()));
        self.tokens.push(RawToken {
            kind,
            text: text.into(),
            leading,
            trailing: Vec::new(),
        });
        Ok(())
    }

    /// Buffer a trivia piece; it is attached when the next token arrives.
    pub fn trivia(&mut self, trivia: Trivia) {
        if !trivia.is_empty() {
            self.pending.push(trivia);
        }
    }

    /// Buffer several trivia pieces.
    pub fn trivia_all(&mut self, pieces: impl IntoIterator<Item = Trivia>) {
        for piece in pieces {
            self.trivia(piece);
        }
    }

    /// Close the innermost open node.
    pub fn finish_node(&mut self) -> Result<(), TreeError> {
        let (kind, children) = self.stack.pop().ok_or_else(|| TreeError::Unbalanced {
            message: "finish_node without a matching start_node".to_string(),
        })?;
        let element = RawElement::Node(kind, children);
        match self.stack.last_mut() {
            Some((_, parent)) => parent.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }

    /// Finish the tree, attaching any remaining trivia to the last token.
    pub fn finish(mut self) -> Result<Arc<GreenNode>, TreeError> {
        if let Some((kind, _)) = self.stack.last() {
            return Err(TreeError::Unbalanced {
                message: format!("{} was never finished", kind),
            });
        }
        let root = self.root.take().ok_or_else(|| TreeError::Unbalanced {
            message: "no root node".to_string(),
        })?;

        let rest = std::mem::take(&mut self.pending);
        match self.tokens.last_mut() {
            Some(last) => last.trailing.extend(rest),
            None if rest.is_empty() => {}
            None => {
                return Err(TreeError::SpanInvariant {
                    offset: 0,
                    message: "trivia with no token to own it".to_string(),
                })
            }
        }

        let mut tokens: Vec<Option<RawToken>> = self.tokens.into_iter().map(Some).collect();
        Ok(lower(root, &mut tokens))
    }
}

fn lower(element: RawElement, tokens: &mut [Option<RawToken>]) -> Arc<GreenNode> {
    match element {
        RawElement::Token(index) => match tokens[index].take() {
            Some(tok) => GreenNode::token(tok.kind, tok.leading, tok.text, tok.trailing),
            None => GreenNode::token(SyntaxKind::Punctuation, Vec::new(), "", Vec::new()),
        },
        RawElement::Node(kind, children) => {
            let children = children.into_iter().map(|c| lower(c, tokens)).collect();
            GreenNode::node(kind, children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::kinds::TriviaKind;

    fn ws(text: &str) -> Trivia {
        Trivia::whitespace(text)
    }

    #[test]
    fn builds_nested_nodes() {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::ExpressionStatement).unwrap();
        b.start_node(SyntaxKind::IdentifierName).unwrap();
        b.token(SyntaxKind::Identifier, "x").unwrap();
        b.finish_node().unwrap();
        b.token(SyntaxKind::Punctuation, ";").unwrap();
        b.finish_node().unwrap();
        let root = b.finish().unwrap();

        assert_eq!(root.kind(), SyntaxKind::ExpressionStatement);
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.text(), "x;");
    }

    #[test]
    fn trivia_is_split_at_first_line_break() {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::Block).unwrap();
        b.token(SyntaxKind::Punctuation, "{").unwrap();
        b.trivia(ws(" "));
        b.trivia(Trivia::new(TriviaKind::SingleLineComment, "// open"));
        b.trivia(Trivia::end_of_line());
        b.trivia(ws("    "));
        b.token(SyntaxKind::Punctuation, "}").unwrap();
        b.finish_node().unwrap();
        let root = b.finish().unwrap();

        let tokens = root.tokens();
        assert_eq!(tokens[0].trailing_trivia().len(), 3);
        assert_eq!(tokens[1].leading_trivia(), &[ws("    ")]);
        assert_eq!(root.text(), "{ // open\n    }");
    }

    #[test]
    fn leading_trivia_before_first_token_and_rest_after_last() {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::CompilationUnit).unwrap();
        b.trivia(Trivia::new(TriviaKind::DocComment, "/// doc"));
        b.trivia(Trivia::end_of_line());
        b.token(SyntaxKind::Identifier, "a").unwrap();
        b.finish_node().unwrap();
        b.trivia(Trivia::end_of_line());
        b.trivia(Trivia::end_of_line());
        let root = b.finish().unwrap();

        let tokens = root.tokens();
        assert_eq!(tokens[0].leading_trivia().len(), 2);
        assert_eq!(tokens[0].trailing_trivia().len(), 2);
        assert_eq!(root.text(), "/// doc\na\n\n");
    }

    mod errors {
        use super::*;

        #[test]
        fn token_outside_node() {
            let mut b = TreeBuilder::new();
            let err = b.token(SyntaxKind::Identifier, "x").unwrap_err();
            assert!(matches!(err, TreeError::Unbalanced { .. }));
        }

        #[test]
        fn node_kind_used_as_token() {
            let mut b = TreeBuilder::new();
            b.start_node(SyntaxKind::Block).unwrap();
            let err = b.token(SyntaxKind::Block, "{").unwrap_err();
            assert!(matches!(err, TreeError::KindMismatch { .. }));
        }

        #[test]
        fn unfinished_node() {
            let mut b = TreeBuilder::new();
            b.start_node(SyntaxKind::Block).unwrap();
            assert!(matches!(b.finish(), Err(TreeError::Unbalanced { .. })));
        }

        #[test]
        fn second_root() {
            let mut b = TreeBuilder::new();
            b.start_node(SyntaxKind::Block).unwrap();
            b.finish_node().unwrap();
            assert!(b.start_node(SyntaxKind::Block).is_err());
        }

        #[test]
        fn orphan_trivia() {
            let mut b = TreeBuilder::new();
            b.start_node(SyntaxKind::CompilationUnit).unwrap();
            b.trivia(ws(" "));
            b.finish_node().unwrap();
            assert!(matches!(b.finish(), Err(TreeError::SpanInvariant { .. })));
        }
    }
}
