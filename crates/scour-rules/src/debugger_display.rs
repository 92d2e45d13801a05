//! SC013: public classes with state should say how to show themselves in a
//! debugger.
//!
//! The check works from the type's symbol: it must be a public class with at
//! least one field or property and no `ToString()` override of its own. The
//! fix writes a `[System.Diagnostics.DebuggerDisplay]` after any existing
//! attribute lists. Enumerable types display their count; other types
//! display up to two readable properties, then fields.

use std::sync::Arc;

use scour_core::registry::{Category, RuleDescriptor, RuleOutcome, Subscription, SymbolContext};
use scour_core::rewrite::{FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::symbols::{Accessibility, Symbol, SymbolKind};
use scour_core::tree::{factory, query, GreenNode, Trivia, TriviaKind};
use scour_core::{NodeRef, Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

use crate::support::{at_name, attributes_named, name_text, named_declaration};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC013",
    title: "Public classes should have a DebuggerDisplay",
    message_template: "The public class '{0}' does not have a DebuggerDisplay attribute applied",
    category: Category::Design,
    severity: Severity::Info,
    subscriptions: &[Subscription::Symbol(SymbolKind::NamedType)],
    help_url: None,
};

const DEBUGGER_DISPLAY: &str = "DebuggerDisplay";
const QUALIFIED_ATTRIBUTE: &str = "System.Diagnostics.DebuggerDisplay";
const MAX_DISPLAYED: usize = 2;

pub struct DebuggerDisplay;

impl Rule for DebuggerDisplay {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_symbol(&self, ctx: &SymbolContext<'_>) -> RuleOutcome {
        let symbol = ctx.symbol;
        let Some((_, decl)) = &ctx.declaration else {
            return Ok(Vec::new());
        };
        if decl.kind() != SyntaxKind::ClassDeclaration
            || symbol.is_value_type()
            || symbol.accessibility != Accessibility::Public
        {
            return Ok(Vec::new());
        }

        let members = ctx.model.members(symbol.id);
        let has_state = members
            .iter()
            .any(|m| matches!(m.kind, SymbolKind::Property | SymbolKind::Field));
        let has_to_string = members
            .iter()
            .any(|m| m.kind == SymbolKind::Method && m.name == "ToString" && m.parameters.is_empty());
        if !has_state || has_to_string {
            return Ok(Vec::new());
        }
        if declared_display(symbol) || written_display(decl) {
            return Ok(Vec::new());
        }

        let name = name_text(decl).unwrap_or(symbol.name.as_str());
        Ok(vec![at_name(decl).arg(name)])
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

fn declared_display(symbol: &Symbol) -> bool {
    symbol
        .attributes
        .iter()
        .filter(|data| data.is(DEBUGGER_DISPLAY))
        .any(|data| data.constructor_args.iter().any(|arg| !arg.is_empty()))
}

/// True if the declaration already carries a non-empty `DebuggerDisplay`.
fn written_display(decl: &NodeRef<'_>) -> bool {
    attributes_named(decl, DEBUGGER_DISPLAY).iter().any(|attribute| {
        query::attribute_arguments(attribute)
            .iter()
            .filter(|(name, _)| name.is_none())
            .any(|(_, value)| query::string_value(value).is_none_or(|text| !text.is_empty()))
    })
}

fn is_enumerable(tree: &SyntaxTree, model: &dyn SemanticModel, decl: &NodeRef<'_>) -> bool {
    let starts_enumerable = |name: &str| {
        name.rsplit('.')
            .next()
            .is_some_and(|simple| simple.starts_with("IEnumerable"))
    };
    if let Some(symbol) = model.declared_symbol(tree, decl) {
        if symbol.interfaces.iter().any(|i| starts_enumerable(i)) {
            return true;
        }
    }
    decl.child_of_kind(SyntaxKind::BaseList)
        .map(|base| {
            base.descendants()
                .iter()
                .filter(|n| n.kind() == SyntaxKind::Identifier)
                .filter_map(|n| n.token_text())
                .any(starts_enumerable)
        })
        .unwrap_or(false)
}

fn has_getter(property: &NodeRef<'_>) -> bool {
    match property.child_of_kind(SyntaxKind::AccessorList) {
        Some(accessors) => accessors
            .children_of_kind(SyntaxKind::AccessorDeclaration)
            .iter()
            .any(|a| a.first_token().and_then(|t| t.token_text()) == Some("get")),
        // Expression-bodied properties are read-only.
        None => property.child_token("=>").is_some(),
    }
}

/// The display string: `Count={Count()}` for enumerables, otherwise
/// `Name={Name}` pairs for readable properties, then fields.
fn display_text(tree: &SyntaxTree, model: &dyn SemanticModel, decl: &NodeRef<'_>) -> Option<String> {
    if is_enumerable(tree, model, decl) {
        return Some("Count={Count()}".to_string());
    }

    let properties = decl
        .children_of_kind(SyntaxKind::PropertyDeclaration)
        .into_iter()
        .filter(has_getter);
    let fields = decl.children_of_kind(SyntaxKind::FieldDeclaration).into_iter();
    let shown: Vec<String> = properties
        .chain(fields)
        .filter_map(|member| name_text(&member).map(|name| format!("{0}={{{0}}}", name)))
        .take(MAX_DISPLAYED)
        .collect();
    if shown.is_empty() {
        None
    } else {
        Some(shown.join(" "))
    }
}

/// `[System.Diagnostics.DebuggerDisplay("<text>")]` followed by a line break.
fn attribute_list(text: &str, leading: Vec<Trivia>) -> Arc<GreenNode> {
    let arguments = GreenNode::node(
        SyntaxKind::AttributeArgumentList,
        vec![
            factory::punct("("),
            GreenNode::node(SyntaxKind::AttributeArgument, vec![factory::string_literal(text)]),
            factory::punct(")"),
        ],
    );
    let attribute = GreenNode::node(
        SyntaxKind::Attribute,
        vec![factory::qualified_name(QUALIFIED_ATTRIBUTE), arguments],
    );
    GreenNode::node(
        SyntaxKind::AttributeList,
        vec![factory::punct("["), attribute, factory::punct("]")],
    )
    .with_leading_trivia(leading)
    .with_trailing_trivia(vec![Trivia::end_of_line()])
}

/// Whitespace at the end of `trivia`, after its last line break.
fn indentation(trivia: &[Trivia]) -> Vec<Trivia> {
    let start = trivia
        .iter()
        .rposition(|t| t.kind != TriviaKind::Whitespace)
        .map_or(0, |i| i + 1);
    trivia[start..].to_vec()
}

impl FixProvider for DebuggerDisplay {
    fn title(&self) -> &str {
        "Add a DebuggerDisplay attribute"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let decl = named_declaration(tree, diagnostic, SyntaxKind::ClassDeclaration)?;
        if written_display(&decl) {
            return Err(RewriteError::invalid_target(
                "class already has a DebuggerDisplay attribute",
            ));
        }
        let text = display_text(tree, model, &decl)
            .ok_or_else(|| RewriteError::invalid_target("class has no state to display"))?;

        let children = decl.green().children();
        let at = children
            .iter()
            .take_while(|c| c.kind() == SyntaxKind::AttributeList)
            .count();
        let anchor = children
            .get(at)
            .ok_or_else(|| RewriteError::invalid_target("class declaration is empty"))?;

        let leading = anchor.leading_trivia();
        let list = attribute_list(&text, leading.to_vec());
        let replacement = decl
            .green()
            .with_child(at, anchor.with_leading_trivia(indentation(leading)))
            .with_inserted_child(at, list);
        Ok(Patch::replace(&decl, replacement, self.title()))
    }
}
