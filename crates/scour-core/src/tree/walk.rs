//! Source-order traversal with visitor control.

use super::syntax::NodeRef;

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    #[default]
    Continue,
    /// Skip children, continue with siblings. `leave` is still called.
    SkipChildren,
    /// Stop traversal entirely. No further `visit` or `leave` calls.
    Stop,
}

/// Receives interior nodes in depth-first source order.
pub trait Visitor<'t> {
    fn visit(&mut self, node: &NodeRef<'t>) -> VisitResult;

    fn leave(&mut self, _node: &NodeRef<'t>) {}
}

/// Walk the interior nodes under and including `root`.
///
/// Returns `false` if the visitor stopped the walk.
pub fn walk<'t, V: Visitor<'t>>(root: &NodeRef<'t>, visitor: &mut V) -> bool {
    enum Step<'t> {
        Enter(NodeRef<'t>),
        Leave(NodeRef<'t>),
    }

    let mut stack = vec![Step::Enter(root.clone())];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => match visitor.visit(&node) {
                VisitResult::Stop => return false,
                VisitResult::SkipChildren => visitor.leave(&node),
                VisitResult::Continue => {
                    let children = node.child_nodes();
                    stack.push(Step::Leave(node));
                    stack.extend(children.into_iter().rev().map(Step::Enter));
                }
            },
            Step::Leave(node) => visitor.leave(&node),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::kinds::SyntaxKind;
    use crate::tree::notation::parse_tree;

    struct Recorder {
        events: Vec<String>,
        skip: Option<SyntaxKind>,
        stop: Option<SyntaxKind>,
    }

    impl<'t> Visitor<'t> for Recorder {
        fn visit(&mut self, node: &NodeRef<'t>) -> VisitResult {
            if Some(node.kind()) == self.stop {
                return VisitResult::Stop;
            }
            self.events.push(format!("+{}", node.kind()));
            if Some(node.kind()) == self.skip {
                VisitResult::SkipChildren
            } else {
                VisitResult::Continue
            }
        }

        fn leave(&mut self, node: &NodeRef<'t>) {
            self.events.push(format!("-{}", node.kind()));
        }
    }

    fn tree() -> crate::tree::SyntaxTree {
        parse_tree(
            "t.cs",
            r#"(block "{" (expression_statement (identifier_name "a") ";") (return_statement "return" ";") "}")"#,
        )
        .unwrap()
    }

    #[test]
    fn visits_in_source_order() {
        let tree = tree();
        let mut rec = Recorder {
            events: vec![],
            skip: None,
            stop: None,
        };
        assert!(walk(&tree.root(), &mut rec));
        assert_eq!(
            rec.events,
            vec![
                "+block",
                "+expression_statement",
                "+identifier_name",
                "-identifier_name",
                "-expression_statement",
                "+return_statement",
                "-return_statement",
                "-block",
            ]
        );
    }

    #[test]
    fn skip_children_still_leaves() {
        let tree = tree();
        let mut rec = Recorder {
            events: vec![],
            skip: Some(SyntaxKind::ExpressionStatement),
            stop: None,
        };
        walk(&tree.root(), &mut rec);
        assert!(!rec.events.contains(&"+identifier_name".to_string()));
        assert!(rec.events.contains(&"-expression_statement".to_string()));
    }

    #[test]
    fn stop_ends_walk() {
        let tree = tree();
        let mut rec = Recorder {
            events: vec![],
            skip: None,
            stop: Some(SyntaxKind::ReturnStatement),
        };
        assert!(!walk(&tree.root(), &mut rec));
        assert_eq!(rec.events.last().map(String::as_str), Some("-expression_statement"));
    }
}
