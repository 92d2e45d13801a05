//! Persistent tree storage.
//!
//! A `GreenNode` records only its kind, its full width and its content, never
//! an absolute position. That makes every subtree position-independent, so a
//! rewrite can rebuild the spine above an edit and share everything else with
//! the previous snapshot.

use std::fmt;
use std::sync::Arc;

use super::kinds::{SyntaxKind, TriviaKind};

/// One piece of trivia owned by a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Trivia {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Trivia::new(TriviaKind::Whitespace, text)
    }

    pub fn end_of_line() -> Self {
        Trivia::new(TriviaKind::EndOfLine, "\n")
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Payload {
    Interior(Vec<Arc<GreenNode>>),
    Token {
        leading: Vec<Trivia>,
        text: String,
        trailing: Vec<Trivia>,
    },
}

/// An immutable tree element: either an interior node or a token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenNode {
    kind: SyntaxKind,
    width: usize,
    payload: Payload,
}

impl GreenNode {
    /// Create an interior node.
    ///
    /// # Panics
    /// Panics if `kind` is a token kind.
    pub fn node(kind: SyntaxKind, children: Vec<Arc<GreenNode>>) -> Arc<GreenNode> {
        assert!(!kind.is_token(), "{} is a token kind", kind);
        let width = children.iter().map(|c| c.width).sum();
        Arc::new(GreenNode {
            kind,
            width,
            payload: Payload::Interior(children),
        })
    }

    /// Create a token with its trivia.
    ///
    /// # Panics
    /// Panics if `kind` is not a token kind.
    pub fn token(
        kind: SyntaxKind,
        leading: Vec<Trivia>,
        text: impl Into<String>,
        trailing: Vec<Trivia>,
    ) -> Arc<GreenNode> {
        assert!(kind.is_token(), "{} is not a token kind", kind);
        let text = text.into();
        let width = leading.iter().map(Trivia::len).sum::<usize>()
            + text.len()
            + trailing.iter().map(Trivia::len).sum::<usize>();
        Arc::new(GreenNode {
            kind,
            width,
            payload: Payload::Token {
                leading,
                text,
                trailing,
            },
        })
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn is_token(&self) -> bool {
        matches!(self.payload, Payload::Token { .. })
    }

    /// Width including all trivia.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Children of an interior node; empty for tokens.
    pub fn children(&self) -> &[Arc<GreenNode>] {
        match &self.payload {
            Payload::Interior(children) => children,
            Payload::Token { .. } => &[],
        }
    }

    /// Token text without trivia; `None` for interior nodes.
    pub fn token_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Token { text, .. } => Some(text),
            Payload::Interior(_) => None,
        }
    }

    /// Trivia preceding this element (its first token's leading trivia).
    pub fn leading_trivia(&self) -> &[Trivia] {
        match &self.payload {
            Payload::Token { leading, .. } => leading,
            Payload::Interior(children) => children
                .iter()
                .find(|c| c.width > 0 || c.is_token())
                .map(|c| c.leading_trivia())
                .unwrap_or(&[]),
        }
    }

    /// Trivia following this element (its last token's trailing trivia).
    pub fn trailing_trivia(&self) -> &[Trivia] {
        match &self.payload {
            Payload::Token { trailing, .. } => trailing,
            Payload::Interior(children) => children
                .iter()
                .rev()
                .find(|c| c.width > 0 || c.is_token())
                .map(|c| c.trailing_trivia())
                .unwrap_or(&[]),
        }
    }

    /// Width of the leading trivia.
    pub fn leading_width(&self) -> usize {
        self.leading_trivia().iter().map(Trivia::len).sum()
    }

    /// Width of the trailing trivia.
    pub fn trailing_width(&self) -> usize {
        self.trailing_trivia().iter().map(Trivia::len).sum()
    }

    /// Full source text including trivia.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.width);
        self.write_text(&mut out);
        out
    }

    /// Source text without the outer leading and trailing trivia.
    pub fn trimmed_text(&self) -> String {
        let full = self.text();
        let start = self.leading_width();
        let end = full.len().saturating_sub(self.trailing_width()).max(start);
        full[start..end].to_string()
    }

    fn write_text(&self, out: &mut String) {
        match &self.payload {
            Payload::Interior(children) => {
                for child in children {
                    child.write_text(out);
                }
            }
            Payload::Token {
                leading,
                text,
                trailing,
            } => {
                for t in leading {
                    out.push_str(&t.text);
                }
                out.push_str(text);
                for t in trailing {
                    out.push_str(&t.text);
                }
            }
        }
    }

    /// Tokens of this subtree in source order.
    pub fn tokens(self: &Arc<Self>) -> Vec<Arc<GreenNode>> {
        let mut out = Vec::new();
        collect_tokens(self, &mut out);
        out
    }

    /// Copy of this node with child `index` replaced.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds or this is a token.
    pub fn with_child(&self, index: usize, child: Arc<GreenNode>) -> Arc<GreenNode> {
        let mut children = self.children().to_vec();
        assert!(index < children.len(), "child index {} out of bounds", index);
        children[index] = child;
        GreenNode::node(self.kind, children)
    }

    /// Copy of this node with `child` inserted before position `index`.
    pub fn with_inserted_child(&self, index: usize, child: Arc<GreenNode>) -> Arc<GreenNode> {
        let mut children = self.children().to_vec();
        children.insert(index.min(children.len()), child);
        GreenNode::node(self.kind, children)
    }

    /// Copy of a token with new text, trivia kept.
    pub fn with_token_text(&self, text: impl Into<String>) -> Arc<GreenNode> {
        match &self.payload {
            Payload::Token {
                leading, trailing, ..
            } => GreenNode::token(self.kind, leading.clone(), text, trailing.clone()),
            Payload::Interior(_) => Arc::new(self.clone()),
        }
    }

    /// Copy with the first token's leading trivia replaced.
    pub fn with_leading_trivia(&self, trivia: Vec<Trivia>) -> Arc<GreenNode> {
        match &self.payload {
            Payload::Token { text, trailing, .. } => {
                GreenNode::token(self.kind, trivia, text.clone(), trailing.clone())
            }
            Payload::Interior(children) => {
                match children.iter().position(|c| c.width > 0 || c.is_token()) {
                    Some(i) => self.with_child(i, children[i].with_leading_trivia(trivia)),
                    None => Arc::new(self.clone()),
                }
            }
        }
    }

    /// Copy with the last token's trailing trivia replaced.
    pub fn with_trailing_trivia(&self, trivia: Vec<Trivia>) -> Arc<GreenNode> {
        match &self.payload {
            Payload::Token { leading, text, .. } => {
                GreenNode::token(self.kind, leading.clone(), text.clone(), trivia)
            }
            Payload::Interior(children) => {
                match children.iter().rposition(|c| c.width > 0 || c.is_token()) {
                    Some(i) => self.with_child(i, children[i].with_trailing_trivia(trivia)),
                    None => Arc::new(self.clone()),
                }
            }
        }
    }

    /// Copy with every token rebuilt by `f`, in source order.
    pub fn map_tokens<F>(self: &Arc<Self>, f: &mut F) -> Arc<GreenNode>
    where
        F: FnMut(&GreenNode) -> Arc<GreenNode>,
    {
        match &self.payload {
            Payload::Token { .. } => f(&**self),
            Payload::Interior(children) => {
                let mut mapped = Vec::with_capacity(children.len());
                for child in children {
                    mapped.push(child.map_tokens(f));
                }
                GreenNode::node(self.kind, mapped)
            }
        }
    }

    /// Token parts as `(leading, text, trailing)`; `None` for interior nodes.
    pub fn token_parts(&self) -> Option<(&[Trivia], &str, &[Trivia])> {
        match &self.payload {
            Payload::Token {
                leading,
                text,
                trailing,
            } => Some((leading, text, trailing)),
            Payload::Interior(_) => None,
        }
    }
}

fn collect_tokens(node: &Arc<GreenNode>, out: &mut Vec<Arc<GreenNode>>) {
    if node.is_token() {
        out.push(Arc::clone(node));
    } else {
        for child in node.children() {
            collect_tokens(child, out);
        }
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Token { text, .. } => write!(f, "{}@{:?}", self.kind, text),
            Payload::Interior(children) => f
                .debug_tuple(self.kind.name())
                .field(&children.len())
                .finish(),
        }
    }
}
