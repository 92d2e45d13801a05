//! Positioned, read-only view over a green tree.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::green::{GreenNode, Trivia};
use super::kinds::SyntaxKind;
use super::TreeError;
use crate::text::LineIndex;
use crate::types::{ContentHash, Span};

/// Identity of a node within one snapshot: child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<u32>);

impl NodePath {
    /// The root's path.
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of child `index` of this node.
    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = self.0.clone();
        indices.push(index as u32);
        NodePath(indices)
    }

    /// Path of the parent, `None` at the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.0.is_empty() {
            None
        } else {
            Some(NodePath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// True if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<Vec<u32>> for NodePath {
    fn from(indices: Vec<u32>) -> Self {
        NodePath(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        f.write_str(&parts.join("/"))
    }
}

/// One compilation unit snapshot: file path, root and full text.
#[derive(Clone)]
pub struct SyntaxTree {
    path: String,
    root: Arc<GreenNode>,
    text: Arc<str>,
    lines: Arc<LineIndex>,
}

impl SyntaxTree {
    /// Wrap a root node. The root must be a compilation unit or any interior
    /// node; its text becomes the snapshot text.
    pub fn new(path: impl Into<String>, root: Arc<GreenNode>) -> Self {
        let text: Arc<str> = Arc::from(root.text());
        let lines = Arc::new(LineIndex::new(&text));
        SyntaxTree {
            path: path.into(),
            root,
            text,
            lines,
        }
    }

    /// File path this unit was parsed from.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn green(&self) -> &Arc<GreenNode> {
        &self.root
    }

    /// Positioned root node.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            green: &self.root,
            offset: 0,
            path: NodePath::root(),
        }
    }

    /// Hash of the unit text, used to detect snapshot drift.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(self.text.as_bytes())
    }

    /// 1-indexed line and column of `offset`.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        self.lines.position(&self.text, offset)
    }

    /// Resolve a path to a node, if it still exists in this snapshot.
    pub fn node(&self, path: &NodePath) -> Option<NodeRef<'_>> {
        let mut current = self.root();
        for &index in path.indices() {
            current = current.child(index as usize)?;
        }
        Some(current)
    }

    /// Innermost element (token or node) whose full span covers `offset`.
    pub fn node_at(&self, offset: usize) -> Result<NodeRef<'_>, TreeError> {
        if offset >= self.text.len() {
            return Err(TreeError::OutOfRangeLocation {
                offset,
                len: self.text.len(),
            });
        }
        let mut current = self.root();
        'descend: loop {
            for child in current.children() {
                if child.full_span().contains_offset(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Ok(current);
        }
    }

    /// Innermost token whose full span covers `offset`.
    pub fn token_at(&self, offset: usize) -> Result<NodeRef<'_>, TreeError> {
        let node = self.node_at(offset)?;
        if node.is_token() {
            Ok(node)
        } else {
            node.first_token().ok_or(TreeError::OutOfRangeLocation {
                offset,
                len: self.text.len(),
            })
        }
    }

    /// Node of `kind` whose trimmed span is exactly `span`.
    ///
    /// This is how a diagnostic location is mapped back to its node.
    pub fn find_node(&self, span: Span, kind: SyntaxKind) -> Option<NodeRef<'_>> {
        if span.end > self.text.len() {
            return None;
        }
        let mut current = self.root();
        loop {
            if current.kind() == kind && current.span() == span {
                return Some(current);
            }
            let next = current
                .children()
                .into_iter()
                .find(|c| c.full_span().contains(&span) && !c.full_span().is_empty());
            match next {
                Some(child) => current = child,
                None => return None,
            }
        }
    }

    /// All nodes in source-order preorder, root first.
    pub fn preorder(&self) -> Vec<NodeRef<'_>> {
        let root = self.root();
        let mut out = vec![root.clone()];
        out.extend(root.descendants());
        out
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("path", &self.path)
            .field("len", &self.text.len())
            .finish()
    }
}

/// A cursor at one element of a tree: the green node plus its absolute
/// offset and path.
#[derive(Clone)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    green: &'t Arc<GreenNode>,
    offset: usize,
    path: NodePath,
}

impl<'t> NodeRef<'t> {
    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn green(&self) -> &'t Arc<GreenNode> {
        self.green
    }

    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn is_token(&self) -> bool {
        self.green.is_token()
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Span including leading and trailing trivia.
    pub fn full_span(&self) -> Span {
        Span::at(self.offset, self.green.width())
    }

    /// Span without the outer leading and trailing trivia.
    pub fn span(&self) -> Span {
        let start = self.offset + self.green.leading_width();
        let end = (self.offset + self.green.width())
            .saturating_sub(self.green.trailing_width())
            .max(start);
        Span::new(start, end)
    }

    /// Source text without outer trivia.
    pub fn text(&self) -> &'t str {
        let span = self.span();
        &self.tree.text()[span.start..span.end]
    }

    /// Source text with trivia.
    pub fn full_text(&self) -> &'t str {
        let span = self.full_span();
        &self.tree.text()[span.start..span.end]
    }

    /// Token text; `None` for interior nodes.
    pub fn token_text(&self) -> Option<&'t str> {
        self.green.token_text()
    }

    pub fn leading_trivia(&self) -> &'t [Trivia] {
        self.green.leading_trivia()
    }

    pub fn trailing_trivia(&self) -> &'t [Trivia] {
        self.green.trailing_trivia()
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        let children = self.green.children();
        let green = children.get(index)?;
        let offset = self.offset + children[..index].iter().map(|c| c.width()).sum::<usize>();
        Some(NodeRef {
            tree: self.tree,
            green,
            offset,
            path: self.path.child(index),
        })
    }

    /// Children (nodes and tokens) in source order.
    pub fn children(&self) -> Vec<NodeRef<'t>> {
        let mut out = Vec::with_capacity(self.green.children().len());
        let mut offset = self.offset;
        for (i, green) in self.green.children().iter().enumerate() {
            out.push(NodeRef {
                tree: self.tree,
                green,
                offset,
                path: self.path.child(i),
            });
            offset += green.width();
        }
        out
    }

    /// Interior children only.
    pub fn child_nodes(&self) -> Vec<NodeRef<'t>> {
        self.children().into_iter().filter(|c| !c.is_token()).collect()
    }

    /// First child of the given kind.
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<NodeRef<'t>> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    /// All children of the given kind.
    pub fn children_of_kind(&self, kind: SyntaxKind) -> Vec<NodeRef<'t>> {
        self.children()
            .into_iter()
            .filter(|c| c.kind() == kind)
            .collect()
    }

    /// First child token with exactly this text.
    pub fn child_token(&self, text: &str) -> Option<NodeRef<'t>> {
        self.children()
            .into_iter()
            .find(|c| c.token_text() == Some(text))
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        let parent_path = self.path.parent()?;
        self.tree.node(&parent_path)
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> Vec<NodeRef<'t>> {
        let mut out = Vec::with_capacity(self.path.depth());
        let mut current = self.tree.root();
        for &index in self.path.indices() {
            out.push(current.clone());
            match current.child(index as usize) {
                Some(next) => current = next,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Nearest ancestor whose kind is in `kinds`.
    pub fn first_ancestor_of(&self, kinds: &[SyntaxKind]) -> Option<NodeRef<'t>> {
        self.ancestors()
            .into_iter()
            .find(|a| kinds.contains(&a.kind()))
    }

    /// `self` if its kind is in `kinds`, else the nearest such ancestor.
    pub fn first_ancestor_or_self_of(&self, kinds: &[SyntaxKind]) -> Option<NodeRef<'t>> {
        if kinds.contains(&self.kind()) {
            Some(self.clone())
        } else {
            self.first_ancestor_of(kinds)
        }
    }

    /// Descendants in source-order preorder, excluding `self`.
    pub fn descendants(&self) -> Vec<NodeRef<'t>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef<'t>> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Descendants of the given kind in source order.
    pub fn descendants_of_kind(&self, kind: SyntaxKind) -> Vec<NodeRef<'t>> {
        self.descendants()
            .into_iter()
            .filter(|d| d.kind() == kind)
            .collect()
    }

    /// First descendant token, or `self` if it is a token.
    pub fn first_token(&self) -> Option<NodeRef<'t>> {
        if self.is_token() {
            return Some(self.clone());
        }
        self.children().into_iter().find_map(|c| c.first_token())
    }

    /// Last descendant token, or `self` if it is a token.
    pub fn last_token(&self) -> Option<NodeRef<'t>> {
        if self.is_token() {
            return Some(self.clone());
        }
        self.children().into_iter().rev().find_map(|c| c.last_token())
    }

    /// Token immediately preceding this element in the whole tree.
    pub fn previous_token(&self) -> Option<NodeRef<'t>> {
        let start = self.full_span().start;
        if start == 0 {
            return None;
        }
        self.tree.token_at(start - 1).ok()
    }

    /// True if a line break separates this element from the previous token.
    pub fn starts_line(&self) -> bool {
        use super::kinds::TriviaKind;
        let in_leading = self
            .leading_trivia()
            .iter()
            .any(|t| t.kind == TriviaKind::EndOfLine);
        let after_break = match self.previous_token() {
            Some(prev) => prev
                .trailing_trivia()
                .last()
                .is_some_and(|t| t.kind == TriviaKind::EndOfLine),
            None => true,
        };
        in_leading || after_break
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.path == other.path
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::notation::parse_tree;

    // if (x)
    //     Foo();
    fn sample() -> SyntaxTree {
        parse_tree(
            "Sample.cs",
            r#"(if_statement "if " "(" (identifier_name "x") ")" "\n"
                 "    " (expression_statement
                   (invocation_expression (identifier_name "Foo") (argument_list "(" ")")) ";" "\n"))"#,
        )
        .unwrap()
    }

    mod navigation {
        use super::*;

        #[test]
        fn spans_exclude_outer_trivia() {
            let tree = sample();
            assert_eq!(tree.text(), "if (x)\n    Foo();\n");
            let stmt = tree
                .root()
                .child_of_kind(SyntaxKind::ExpressionStatement)
                .unwrap();
            assert_eq!(stmt.text(), "Foo();");
            assert_eq!(stmt.full_text(), "    Foo();\n");
            assert_eq!(stmt.span(), Span::new(11, 17));
            assert_eq!(stmt.full_span(), Span::new(7, 18));
        }

        #[test]
        fn paths_resolve_back_to_nodes() {
            let tree = sample();
            let foo = tree.root().descendants_of_kind(SyntaxKind::IdentifierName)[1].clone();
            assert_eq!(foo.text(), "Foo");
            let again = tree.node(foo.path()).unwrap();
            assert_eq!(again, foo);
            assert_eq!(foo.path().to_string(), "/4/0/0");
        }

        #[test]
        fn ancestors_run_parent_to_root() {
            let tree = sample();
            let foo = tree.root().descendants_of_kind(SyntaxKind::IdentifierName)[1].clone();
            let kinds: Vec<SyntaxKind> = foo.ancestors().iter().map(|a| a.kind()).collect();
            assert_eq!(
                kinds,
                vec![
                    SyntaxKind::InvocationExpression,
                    SyntaxKind::ExpressionStatement,
                    SyntaxKind::IfStatement,
                ]
            );
            assert_eq!(
                foo.first_ancestor_of(&[SyntaxKind::IfStatement])
                    .map(|n| n.kind()),
                Some(SyntaxKind::IfStatement)
            );
            assert_eq!(foo.parent().unwrap().kind(), SyntaxKind::InvocationExpression);
        }

        #[test]
        fn descendants_are_preorder() {
            let tree = sample();
            let kinds: Vec<SyntaxKind> = tree
                .root()
                .descendants()
                .iter()
                .filter(|d| !d.is_token())
                .map(|d| d.kind())
                .collect();
            assert_eq!(
                kinds,
                vec![
                    SyntaxKind::IdentifierName,
                    SyntaxKind::ExpressionStatement,
                    SyntaxKind::InvocationExpression,
                    SyntaxKind::IdentifierName,
                    SyntaxKind::ArgumentList,
                ]
            );
        }

        #[test]
        fn starts_line_sees_previous_line_break() {
            let tree = sample();
            let stmt = tree
                .root()
                .child_of_kind(SyntaxKind::ExpressionStatement)
                .unwrap();
            assert!(stmt.starts_line());
            let paren = tree.root().child_token("(").unwrap();
            assert!(!paren.starts_line());
            assert!(tree.root().starts_line());
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn node_at_finds_innermost_token() {
            let tree = sample();
            let node = tree.node_at(12).unwrap();
            assert!(node.is_token());
            assert_eq!(node.token_text(), Some("Foo"));
        }

        #[test]
        fn node_at_end_is_out_of_range() {
            let tree = sample();
            let len = tree.text().len();
            assert_eq!(
                tree.node_at(len).unwrap_err(),
                TreeError::OutOfRangeLocation { offset: len, len }
            );
        }

        #[test]
        fn find_node_by_span_and_kind() {
            let tree = sample();
            let found = tree
                .find_node(Span::new(11, 17), SyntaxKind::ExpressionStatement)
                .unwrap();
            assert_eq!(found.text(), "Foo();");
            assert!(tree
                .find_node(Span::new(11, 16), SyntaxKind::ExpressionStatement)
                .is_none());
            assert!(tree
                .find_node(Span::new(90, 95), SyntaxKind::Block)
                .is_none());
        }

        #[test]
        fn line_and_column() {
            let tree = sample();
            assert_eq!(tree.position(11), (2, 5));
        }
    }
}
