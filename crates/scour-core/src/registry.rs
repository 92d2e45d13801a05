//! Rule descriptors, the `Rule` trait and the immutable registry.
//!
//! Rules are registered once through [`RegistryBuilder`]. The built
//! [`Registry`] holds a dense table from every node kind and symbol kind to
//! the rules subscribed to it, and is passed by reference into each
//! dispatch.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::RuleSettings;
use crate::rewrite::FixProvider;
use crate::symbols::{SemanticModel, Symbol, SymbolKind};
use crate::tree::{NodeRef, SyntaxKind, SyntaxTree};
use crate::types::{Severity, Span};

// ============================================================================
// Descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Usage,
    Formatting,
    Design,
    Documentation,
    Performance,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Usage => "usage",
            Category::Formatting => "formatting",
            Category::Design => "design",
            Category::Documentation => "documentation",
            Category::Performance => "performance",
        };
        f.write_str(name)
    }
}

/// What a rule wants to be called for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscription {
    /// Every interior node of this kind.
    Node(SyntaxKind),
    /// Every declared symbol of this kind, once, at its declaring node.
    /// `Assembly` fires once per compilation.
    Symbol(SymbolKind),
}

/// Static description of a rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Message with positional `{0}`, `{1}`... placeholders.
    pub message_template: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub subscriptions: &'static [Subscription],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<&'static str>,
}

impl RuleDescriptor {
    pub fn format_message(&self, args: &[String]) -> String {
        format_message(self.message_template, args)
    }
}

/// Substitute `{n}` placeholders. Placeholders without a matching argument
/// are left as written.
pub fn format_message(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();
        let arg = after[..digits]
            .parse::<usize>()
            .ok()
            .filter(|_| after[digits..].starts_with('}'))
            .and_then(|i| args.get(i));
        match arg {
            Some(value) => {
                out.push_str(value);
                rest = &after[digits + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Rule callbacks
// ============================================================================

/// A node handed to a node subscription.
pub struct NodeContext<'a> {
    pub tree: &'a SyntaxTree,
    pub node: NodeRef<'a>,
    pub model: &'a dyn SemanticModel,
}

impl<'a> NodeContext<'a> {
    /// Symbol the node declares, or else the symbol it refers to.
    pub fn symbol(&self) -> Option<&'a Symbol> {
        let model = self.model;
        model
            .declared_symbol(self.tree, &self.node)
            .or_else(|| model.resolve(self.tree, &self.node))
    }

    /// Symbol bound at another node of the same unit.
    pub fn resolve(&self, node: &NodeRef<'_>) -> Option<&'a Symbol> {
        let model = self.model;
        model.resolve(self.tree, node)
    }
}

/// A symbol handed to a symbol subscription.
pub struct SymbolContext<'a> {
    pub symbol: &'a Symbol,
    pub model: &'a dyn SemanticModel,
    /// Declaring unit and node; `None` for the assembly.
    pub declaration: Option<(&'a SyntaxTree, NodeRef<'a>)>,
}

/// One violation as seen by a rule, before the engine resolves its message
/// and locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub locations: Vec<Span>,
    pub args: Vec<String>,
}

impl Finding {
    pub fn at(span: Span) -> Self {
        Finding {
            locations: vec![span],
            args: Vec::new(),
        }
    }

    /// A finding with no source location, e.g. a missing assembly attribute.
    pub fn unlocated() -> Self {
        Finding {
            locations: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// An unexpected condition inside a rule callback. The dispatcher logs it and
/// treats the invocation as having found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleFault {
    #[error("unexpected {kind} shape: {message}")]
    UnexpectedShape { kind: SyntaxKind, message: String },

    #[error("{0}")]
    Failed(String),
}

impl RuleFault {
    pub fn shape(node: &NodeRef<'_>, message: impl Into<String>) -> Self {
        RuleFault::UnexpectedShape {
            kind: node.kind(),
            message: message.into(),
        }
    }
}

/// `Ok(vec![])` means no diagnostic.
pub type RuleOutcome = Result<Vec<Finding>, RuleFault>;

/// An inspection rule.
pub trait Rule: Send + Sync {
    fn descriptor(&self) -> &RuleDescriptor;

    fn check_node(&self, _ctx: &NodeContext<'_>) -> RuleOutcome {
        Ok(Vec::new())
    }

    fn check_symbol(&self, _ctx: &SymbolContext<'_>) -> RuleOutcome {
        Ok(Vec::new())
    }

    /// The rule's fix provider, if it has one.
    fn fix(&self) -> Option<&dyn FixProvider> {
        None
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("rule {0} is registered more than once")]
    DuplicateRule(String),

    #[error("unknown rule {0}")]
    UnknownRule(String),
}

/// A rule plus its effective configuration.
pub struct RegisteredRule {
    rule: Box<dyn Rule>,
    severity: Severity,
    enabled: bool,
}

impl RegisteredRule {
    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    pub fn descriptor(&self) -> &RuleDescriptor {
        self.rule.descriptor()
    }

    pub fn id(&self) -> &'static str {
        self.rule.descriptor().id
    }

    /// Severity after configuration overrides.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Debug for RegisteredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredRule")
            .field("id", &self.id())
            .field("severity", &self.severity)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Immutable rule table.
#[derive(Debug)]
pub struct Registry {
    rules: Vec<RegisteredRule>,
    by_node: Vec<Vec<usize>>,
    by_symbol: Vec<Vec<usize>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every registered rule, enabled or not, in registration order.
    pub fn rules(&self) -> &[RegisteredRule] {
        &self.rules
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub(crate) fn entry(&self, index: usize) -> &RegisteredRule {
        &self.rules[index]
    }

    /// Enabled rules subscribed to a node kind.
    pub fn node_rules(&self, kind: SyntaxKind) -> &[usize] {
        &self.by_node[kind as usize]
    }

    /// Enabled rules subscribed to a symbol kind.
    pub fn symbol_rules(&self, kind: SymbolKind) -> &[usize] {
        &self.by_symbol[kind as usize]
    }
}

/// Collects rules and configuration, then builds a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    rules: Vec<Box<dyn Rule>>,
    settings: BTreeMap<String, RuleSettings>,
}

impl RegistryBuilder {
    pub fn register(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn register_boxed(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Apply per-rule overrides. Ids that match no rule fail the build.
    pub fn configure(mut self, settings: &BTreeMap<String, RuleSettings>) -> Self {
        self.settings.extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            let id = rule.descriptor().id;
            if !seen.insert(id) {
                return Err(RegistryError::DuplicateRule(id.to_string()));
            }
        }
        if let Some(unknown) = self.settings.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(RegistryError::UnknownRule(unknown.clone()));
        }

        let mut by_node = vec![Vec::new(); SyntaxKind::ALL.len()];
        let mut by_symbol = vec![Vec::new(); SymbolKind::ALL.len()];
        let mut rules = Vec::with_capacity(self.rules.len());

        for (index, rule) in self.rules.into_iter().enumerate() {
            let descriptor = rule.descriptor();
            let settings = self.settings.get(descriptor.id);
            let enabled = !matches!(settings, Some(s) if !s.enabled);
            let severity = settings
                .and_then(|s| s.severity)
                .unwrap_or(descriptor.severity);

            if enabled {
                for subscription in descriptor.subscriptions {
                    match *subscription {
                        Subscription::Node(kind) => by_node[kind as usize].push(index),
                        Subscription::Symbol(kind) => by_symbol[kind as usize].push(index),
                    }
                }
            }
            rules.push(RegisteredRule {
                rule,
                severity,
                enabled,
            });
        }

        Ok(Registry {
            rules,
            by_node,
            by_symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe(RuleDescriptor);

    impl Rule for Probe {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.0
        }
    }

    fn probe(id: &'static str, subscriptions: &'static [Subscription]) -> Probe {
        Probe(RuleDescriptor {
            id,
            title: "probe",
            message_template: "probe {0}",
            category: Category::Usage,
            severity: Severity::Warning,
            subscriptions,
            help_url: None,
        })
    }

    mod messages {
        use super::*;

        #[test]
        fn substitutes_positional_args() {
            let args = vec!["Foo".to_string(), "Bar".to_string()];
            assert_eq!(
                format_message("Method name {0} should be renamed {0}Async", &args),
                "Method name Foo should be renamed FooAsync"
            );
            assert_eq!(format_message("'{1}' then '{0}'", &args), "'Bar' then 'Foo'");
        }

        #[test]
        fn leaves_unmatched_braces() {
            let args = vec!["x".to_string()];
            assert_eq!(format_message("{2} {a} {", &args), "{2} {a} {");
            assert_eq!(format_message("Count={0}", &args), "Count=x");
        }
    }

    mod building {
        use super::*;

        #[test]
        fn tables_by_kind() {
            let registry = Registry::builder()
                .register(probe(
                    "T1",
                    &[
                        Subscription::Node(SyntaxKind::IfStatement),
                        Subscription::Node(SyntaxKind::ElseClause),
                    ],
                ))
                .register(probe("T2", &[Subscription::Node(SyntaxKind::IfStatement)]))
                .register(probe("T3", &[Subscription::Symbol(SymbolKind::Method)]))
                .build()
                .unwrap();
            assert_eq!(registry.node_rules(SyntaxKind::IfStatement), &[0, 1]);
            assert_eq!(registry.node_rules(SyntaxKind::ElseClause), &[0]);
            assert!(registry.node_rules(SyntaxKind::Block).is_empty());
            assert_eq!(registry.symbol_rules(SymbolKind::Method), &[2]);
            assert_eq!(registry.index_of("T3"), Some(2));
        }

        #[test]
        fn rejects_duplicate_ids() {
            let err = Registry::builder()
                .register(probe("T1", &[]))
                .register(probe("T1", &[]))
                .build()
                .unwrap_err();
            assert_eq!(err, RegistryError::DuplicateRule("T1".to_string()));
        }

        #[test]
        fn configuration_disables_and_overrides() {
            let mut settings = BTreeMap::new();
            settings.insert(
                "T1".to_string(),
                RuleSettings {
                    enabled: false,
                    severity: None,
                },
            );
            settings.insert(
                "T2".to_string(),
                RuleSettings {
                    enabled: true,
                    severity: Some(Severity::Error),
                },
            );
            let registry = Registry::builder()
                .register(probe("T1", &[Subscription::Node(SyntaxKind::IfStatement)]))
                .register(probe("T2", &[Subscription::Node(SyntaxKind::IfStatement)]))
                .configure(&settings)
                .build()
                .unwrap();
            assert_eq!(registry.node_rules(SyntaxKind::IfStatement), &[1]);
            assert!(!registry.get("T1").unwrap().enabled());
            assert_eq!(registry.get("T2").unwrap().severity(), Severity::Error);
            assert_eq!(registry.len(), 2);
        }

        #[test]
        fn configuration_for_unknown_rule_fails() {
            let mut settings = BTreeMap::new();
            settings.insert("SC999".to_string(), RuleSettings::default());
            let err = Registry::builder()
                .register(probe("T1", &[]))
                .configure(&settings)
                .build()
                .unwrap_err();
            assert_eq!(err, RegistryError::UnknownRule("SC999".to_string()));
        }
    }
}
