//! SC010: exceptions thrown directly by a non-private member are documented.
//!
//! The thrown type is the first name under the `throw` statement, which
//! covers both `throw new T(...)` and `throw variable`. The enclosing
//! method, constructor or property must carry an `<exception cref="T">`
//! element with a non-blank body in its `///` doc comment. Only the doc
//! comment leading this declaration is read; markup that does not parse
//! counts as undocumented.

use quick_xml::events::Event;
use quick_xml::Reader;
use scour_core::registry::{Category, Finding, NodeContext, RuleDescriptor, RuleOutcome, Subscription};
use scour_core::tree::query;
use scour_core::{NodeRef, Rule, Severity, SyntaxKind};
use tracing::debug;

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC010",
    title: "Document directly thrown exceptions",
    message_template: "Document the direct throw of type '{0}' with an <exception> tag",
    category: Category::Documentation,
    severity: Severity::Error,
    subscriptions: &[Subscription::Node(SyntaxKind::ThrowStatement)],
    help_url: None,
};

const MEMBERS: &[SyntaxKind] = &[
    SyntaxKind::MethodDeclaration,
    SyntaxKind::ConstructorDeclaration,
    SyntaxKind::PropertyDeclaration,
];

pub struct ExceptionDocs;

impl Rule for ExceptionDocs {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_node(&self, ctx: &NodeContext<'_>) -> RuleOutcome {
        let throw = &ctx.node;
        let Some(thrown) = thrown_type(throw) else {
            return Ok(Vec::new());
        };
        let Some(member) = throw.first_ancestor_of(MEMBERS) else {
            return Ok(Vec::new());
        };
        if query::is_private(&member) {
            return Ok(Vec::new());
        }

        let documented = query::doc_comment(&member)
            .map(|doc| match documented_exceptions(&doc) {
                Ok(types) => types.iter().any(|t| cref_matches(t, thrown)),
                Err(err) => {
                    debug!(file = ctx.tree.path(), %err, "unreadable doc comment");
                    false
                }
            })
            .unwrap_or(false);
        if documented {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::at(throw.span()).arg(thrown)])
    }
}

/// Name of the thrown type as written, qualified names included.
fn thrown_type<'t>(throw: &NodeRef<'t>) -> Option<&'t str> {
    let mut name = throw
        .descendants_of_kind(SyntaxKind::IdentifierName)
        .into_iter()
        .next()?;
    while let Some(parent) = name.parent().filter(|p| p.kind() == SyntaxKind::QualifiedName) {
        name = parent;
    }
    Some(name.text())
}

fn cref_matches(cref: &str, thrown: &str) -> bool {
    let cref = cref.trim();
    cref == thrown || cref.strip_prefix("T:") == Some(thrown)
}

/// `cref` values of `<exception>` elements whose body is not blank.
pub fn documented_exceptions(doc: &str) -> Result<Vec<String>, quick_xml::Error> {
    let wrapped = format!("<doc>{}</doc>", doc);
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(true);

    // The open <exception>: its cref, its depth, and whether it has a body.
    let mut open: Option<(Option<String>, usize, bool)> = None;
    let mut depth = 0;
    let mut documented = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                match open.as_mut() {
                    Some(exception) => exception.2 = true,
                    None if e.name().as_ref() == b"exception" => {
                        let cref = e
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.as_ref() == b"cref")
                            .map(|attr| String::from_utf8_lossy(&attr.value).to_string());
                        open = Some((cref, depth, false));
                    }
                    None => {}
                }
            }
            Event::Empty(_) => {
                if let Some(exception) = open.as_mut() {
                    exception.2 = true;
                }
            }
            Event::Text(e) => {
                if let Some(exception) = open.as_mut() {
                    if !e.unescape()?.trim().is_empty() {
                        exception.2 = true;
                    }
                }
            }
            Event::CData(e) => {
                if let Some(exception) = open.as_mut() {
                    if !String::from_utf8_lossy(&e).trim().is_empty() {
                        exception.2 = true;
                    }
                }
            }
            Event::End(_) => {
                if let Some((cref, at, has_body)) = open.take() {
                    if at == depth {
                        if let (Some(cref), true) = (cref, has_body) {
                            documented.push(cref);
                        }
                    } else {
                        open = Some((cref, at, has_body));
                    }
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(documented)
}
