//! SC012: concrete classes should be sealed.

use scour_core::registry::{Category, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::rewrite::{FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::tree::{factory, query, GreenNode};
use scour_core::{Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

use crate::support::{at_name, name_text, named_declaration};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC012",
    title: "Classes should be sealed",
    message_template: "The class '{0}' should be declared sealed if this is a newly written class",
    category: Category::Design,
    severity: Severity::Info,
    subscriptions: &[Subscription::Node(SyntaxKind::ClassDeclaration)],
    help_url: None,
};

const EXEMPT_MODIFIERS: &[&str] = &["sealed", "static", "abstract"];

pub struct SealedClasses;

impl Rule for SealedClasses {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let decl = &ctx.node;
        if EXEMPT_MODIFIERS.iter().any(|m| query::has_modifier(decl, m)) {
            return Ok(Vec::new());
        }
        let symbol = ctx.symbol();
        if symbol.is_some_and(|s| s.is_sealed || s.is_static || s.is_abstract || s.is_value_type()) {
            return Ok(Vec::new());
        }

        let name = name_text(decl)
            .or(symbol.map(|s| s.name.as_str()))
            .unwrap_or_default();
        Ok(vec![at_name(decl).arg(name)])
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

impl FixProvider for SealedClasses {
    fn title(&self) -> &str {
        "Seal the class"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        _model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let decl = named_declaration(tree, diagnostic, SyntaxKind::ClassDeclaration)?;
        if query::has_modifier(&decl, "sealed") {
            return Err(RewriteError::invalid_target("class is already sealed"));
        }

        let children = decl.green().children();
        let class = children
            .iter()
            .position(|c| c.token_text() == Some("class"))
            .ok_or_else(|| RewriteError::invalid_target("class declaration has no class keyword"))?;
        // `sealed` goes before `partial`, which must directly precede `class`.
        let anchor = match class.checked_sub(1) {
            Some(prev) if children[prev].token_text() == Some("partial") => prev,
            _ => class,
        };

        let keyword = &children[anchor];
        let sealed = GreenNode::token(
            SyntaxKind::Keyword,
            keyword.leading_trivia().to_vec(),
            "sealed",
            factory::space(),
        );
        let replacement = decl
            .green()
            .with_child(anchor, keyword.with_leading_trivia(Vec::new()))
            .with_inserted_child(anchor, sealed);
        Ok(Patch::replace(&decl, replacement, self.title()))
    }
}
