//! Best-effort semantic binding.
//!
//! The host binder supplies declared entities and the (file, span) locations
//! that refer to them. Binding may be missing entirely (`Unbound`), so every
//! consumer has to tolerate `None`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{NodeRef, SyntaxKind, SyntaxTree};
use crate::types::{rebase_span, Span, SpanEdit};

// ============================================================================
// Symbol data
// ============================================================================

/// Identity of a symbol within one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Assembly,
    NamedType,
    Method,
    Field,
    Property,
}

impl SymbolKind {
    pub const ALL: &'static [SymbolKind] = &[
        SymbolKind::Assembly,
        SymbolKind::NamedType,
        SymbolKind::Method,
        SymbolKind::Field,
        SymbolKind::Property,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SymbolKind::Assembly => "assembly",
            SymbolKind::NamedType => "named_type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    Private,
    PrivateProtected,
    #[default]
    NotApplicable,
}

/// Kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

/// A named argument of an attribute application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: String,
    pub value: String,
}

/// One attribute application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeData {
    /// Attribute class name, possibly namespace-qualified.
    pub class_name: String,
    #[serde(default)]
    pub constructor_args: Vec<String>,
    #[serde(default)]
    pub named_args: Vec<NamedArgument>,
}

impl AttributeData {
    pub fn new(class_name: impl Into<String>) -> Self {
        AttributeData {
            class_name: class_name.into(),
            constructor_args: Vec::new(),
            named_args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, value: impl Into<String>) -> Self {
        self.constructor_args.push(value.into());
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named_args.push(NamedArgument {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Class name without its namespace.
    pub fn simple_name(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name)
    }

    /// True if this is `name` or `nameAttribute`.
    pub fn is(&self, name: &str) -> bool {
        let simple = self.simple_name();
        simple == name || simple.strip_suffix("Attribute") == Some(name)
    }

    /// Value of the named argument `name`.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.named_args
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Where a symbol is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationLocation {
    pub file: String,
    pub span: Span,
}

/// A reference to a type by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Qualified name as written by the binder, e.g. `System.Threading.Tasks.Task`.
    pub name: String,
    /// Assembly that defines the type, when known.
    #[serde(default)]
    pub assembly: Option<String>,
}

impl TypeRef {
    /// Name without namespace or type arguments.
    pub fn simple_name(&self) -> &str {
        let base = self.name.split('<').next().unwrap_or(&self.name);
        base.rsplit('.').next().unwrap_or(base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub is_params: bool,
}

/// A declared entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Weak reference to the containing named type.
    #[serde(default)]
    pub containing_type: Option<SymbolId>,
    /// Weak reference to the containing assembly.
    #[serde(default)]
    pub containing_assembly: Option<SymbolId>,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    #[serde(default)]
    pub locations: Vec<DeclarationLocation>,
    #[serde(default)]
    pub type_kind: Option<TypeKind>,
    #[serde(default)]
    pub is_sealed: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_override: bool,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub has_getter: bool,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl Symbol {
    /// A symbol with every optional fact at its default.
    pub fn new(id: u32, kind: SymbolKind, name: impl Into<String>) -> Self {
        Symbol {
            id: SymbolId(id),
            kind,
            name: name.into(),
            accessibility: Accessibility::default(),
            containing_type: None,
            containing_assembly: None,
            attributes: Vec::new(),
            locations: Vec::new(),
            type_kind: None,
            is_sealed: false,
            is_abstract: false,
            is_static: false,
            is_override: false,
            return_type: None,
            parameters: Vec::new(),
            has_getter: false,
            interfaces: Vec::new(),
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.type_kind, Some(TypeKind::Struct | TypeKind::Enum))
    }

    /// First attribute that is `name` or `nameAttribute`.
    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        self.attributes.iter().find(|a| a.is(name))
    }

    /// True if the last parameter is a `params` array.
    pub fn takes_params_array(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.is_params)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Structural problems in a symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol id {0} is declared more than once")]
    DuplicateId(SymbolId),

    #[error("symbol {symbol} refers to unknown {role} {target}")]
    UnknownReference {
        symbol: SymbolId,
        role: &'static str,
        target: SymbolId,
    },

    #[error("symbol {symbol}: {role} {target} is a {found}")]
    WrongKind {
        symbol: SymbolId,
        role: &'static str,
        target: SymbolId,
        found: SymbolKind,
    },

    #[error("containing-type chain of symbol {0} is cyclic")]
    Cycle(SymbolId),

    #[error("more than one assembly symbol: {0} and {1}")]
    MultipleAssemblies(SymbolId, SymbolId),

    #[error("binding {file}{span} refers to unknown symbol {symbol}")]
    UnknownBinding {
        file: String,
        span: Span,
        symbol: SymbolId,
    },
}

// ============================================================================
// Semantic model
// ============================================================================

/// Symbol resolution over one compilation.
pub trait SemanticModel: Send + Sync {
    /// Symbol bound at exactly this node's span.
    fn resolve(&self, tree: &SyntaxTree, node: &NodeRef<'_>) -> Option<&Symbol>;

    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// The compilation's assembly.
    fn assembly(&self) -> Option<&Symbol>;

    /// Members declared directly in `ty`, in declaration order.
    fn members(&self, ty: SymbolId) -> Vec<&Symbol>;

    /// The same bindings after `edits` were applied to `file`. Bindings an
    /// edit cuts across are dropped.
    fn rebase(&self, file: &str, edits: &[SpanEdit]) -> Box<dyn SemanticModel>;

    /// False when no binding information exists at all.
    fn is_bound(&self) -> bool {
        true
    }

    fn containing_type(&self, symbol: &Symbol) -> Option<&Symbol> {
        symbol.containing_type.and_then(|id| self.symbol(id))
    }

    fn containing_assembly(&self, symbol: &Symbol) -> Option<&Symbol> {
        symbol
            .containing_assembly
            .and_then(|id| self.symbol(id))
            .or_else(|| self.assembly())
    }

    /// Every containing type, innermost first.
    fn containing_types(&self, symbol: &Symbol) -> Vec<&Symbol> {
        let mut out = Vec::new();
        let mut current = self.containing_type(symbol);
        while let Some(ty) = current {
            out.push(ty);
            current = self.containing_type(ty);
        }
        out
    }

    /// Symbol declared by a declaration node, bound either at the node or at
    /// its name token.
    fn declared_symbol(&self, tree: &SyntaxTree, node: &NodeRef<'_>) -> Option<&Symbol> {
        if !node.kind().declares_symbol() {
            return None;
        }
        self.resolve(tree, node).or_else(|| {
            let name = node.child_of_kind(SyntaxKind::Identifier)?;
            self.resolve(tree, &name)
        })
    }
}

/// The model used when nothing is bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

impl SemanticModel for Unbound {
    fn resolve(&self, _tree: &SyntaxTree, _node: &NodeRef<'_>) -> Option<&Symbol> {
        None
    }

    fn symbol(&self, _id: SymbolId) -> Option<&Symbol> {
        None
    }

    fn assembly(&self) -> Option<&Symbol> {
        None
    }

    fn members(&self, _ty: SymbolId) -> Vec<&Symbol> {
        Vec::new()
    }

    fn rebase(&self, _file: &str, _edits: &[SpanEdit]) -> Box<dyn SemanticModel> {
        Box::new(Unbound)
    }

    fn is_bound(&self) -> bool {
        false
    }
}

/// A validated symbol table with (file, span) bindings.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SymbolId, Symbol>,
    bindings: HashMap<(String, Span), SymbolId>,
    members: BTreeMap<SymbolId, Vec<SymbolId>>,
    assembly: Option<SymbolId>,
}

impl SymbolTable {
    pub fn builder() -> SymbolTableBuilder {
        SymbolTableBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Every (file, span) binding, sorted by file then span.
    pub fn bindings(&self) -> Vec<(&str, Span, SymbolId)> {
        let mut out: Vec<(&str, Span, SymbolId)> = self
            .bindings
            .iter()
            .map(|((file, span), id)| (file.as_str(), *span, *id))
            .collect();
        out.sort();
        out
    }

    /// Symbol bound at `span` in `file`.
    pub fn lookup(&self, file: &str, span: Span) -> Option<&Symbol> {
        let id = self.bindings.get(&(file.to_string(), span))?;
        self.symbols.get(id)
    }

    /// Copy with every binding and declaration location in `file` mapped
    /// through `edits`.
    pub fn rebased(&self, file: &str, edits: &[SpanEdit]) -> SymbolTable {
        let bindings = self
            .bindings
            .iter()
            .filter_map(|((f, span), id)| {
                if f != file {
                    return Some(((f.clone(), *span), *id));
                }
                rebase_span(*span, edits).map(|s| ((f.clone(), s), *id))
            })
            .collect();

        let mut symbols = self.symbols.clone();
        for symbol in symbols.values_mut() {
            symbol.locations = std::mem::take(&mut symbol.locations)
                .into_iter()
                .filter_map(|loc| {
                    if loc.file != file {
                        return Some(loc);
                    }
                    let span = rebase_span(loc.span, edits)?;
                    Some(DeclarationLocation { span, ..loc })
                })
                .collect();
        }

        SymbolTable {
            symbols,
            bindings,
            members: self.members.clone(),
            assembly: self.assembly,
        }
    }
}

impl SemanticModel for SymbolTable {
    fn resolve(&self, tree: &SyntaxTree, node: &NodeRef<'_>) -> Option<&Symbol> {
        self.lookup(tree.path(), node.span())
    }

    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    fn assembly(&self) -> Option<&Symbol> {
        self.assembly.and_then(|id| self.symbols.get(&id))
    }

    fn members(&self, ty: SymbolId) -> Vec<&Symbol> {
        self.members
            .get(&ty)
            .map(|ids| ids.iter().filter_map(|id| self.symbols.get(id)).collect())
            .unwrap_or_default()
    }

    fn rebase(&self, file: &str, edits: &[SpanEdit]) -> Box<dyn SemanticModel> {
        Box::new(self.rebased(file, edits))
    }
}

/// Collects symbols and bindings, then validates them once.
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    symbols: Vec<Symbol>,
    bindings: Vec<(String, Span, SymbolId)>,
}

impl SymbolTableBuilder {
    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Bind the node at `span` in `file` to `symbol`.
    pub fn bind(mut self, file: impl Into<String>, span: Span, symbol: SymbolId) -> Self {
        self.bindings.push((file.into(), span, symbol));
        self
    }

    /// Bind every declaration location of every symbol added so far.
    pub fn bind_declarations(mut self) -> Self {
        let decls: Vec<(String, Span, SymbolId)> = self
            .symbols
            .iter()
            .flat_map(|s| s.locations.iter().map(|l| (l.file.clone(), l.span, s.id)))
            .collect();
        self.bindings.extend(decls);
        self
    }

    /// Validate references and build the table.
    pub fn build(self) -> Result<SymbolTable, SymbolError> {
        let mut symbols = BTreeMap::new();
        let mut order = Vec::with_capacity(self.symbols.len());
        let mut assembly: Option<SymbolId> = None;

        for symbol in self.symbols {
            let id = symbol.id;
            if symbol.kind == SymbolKind::Assembly {
                if let Some(first) = assembly {
                    return Err(SymbolError::MultipleAssemblies(first, id));
                }
                assembly = Some(id);
            }
            if symbols.insert(id, symbol).is_some() {
                return Err(SymbolError::DuplicateId(id));
            }
            order.push(id);
        }

        for symbol in symbols.values() {
            if let Some(target) = symbol.containing_type {
                check_kind(&symbols, symbol.id, "containing type", target, SymbolKind::NamedType)?;
            }
            if let Some(target) = symbol.containing_assembly {
                check_kind(&symbols, symbol.id, "containing assembly", target, SymbolKind::Assembly)?;
            }
        }

        for &id in &order {
            let mut seen = HashSet::new();
            let mut current = Some(id);
            while let Some(cur) = current {
                if !seen.insert(cur) {
                    return Err(SymbolError::Cycle(id));
                }
                current = symbols.get(&cur).and_then(|s| s.containing_type);
            }
        }

        let mut members: BTreeMap<SymbolId, Vec<SymbolId>> = BTreeMap::new();
        for &id in &order {
            if let Some(parent) = symbols.get(&id).and_then(|s| s.containing_type) {
                members.entry(parent).or_default().push(id);
            }
        }

        let mut bindings = HashMap::with_capacity(self.bindings.len());
        for (file, span, symbol) in self.bindings {
            if !symbols.contains_key(&symbol) {
                return Err(SymbolError::UnknownBinding { file, span, symbol });
            }
            bindings.insert((file, span), symbol);
        }

        Ok(SymbolTable {
            symbols,
            bindings,
            members,
            assembly,
        })
    }
}

fn check_kind(
    symbols: &BTreeMap<SymbolId, Symbol>,
    symbol: SymbolId,
    role: &'static str,
    target: SymbolId,
    expected: SymbolKind,
) -> Result<(), SymbolError> {
    match symbols.get(&target) {
        None => Err(SymbolError::UnknownReference {
            symbol,
            role,
            target,
        }),
        Some(found) if found.kind != expected => Err(SymbolError::WrongKind {
            symbol,
            role,
            target,
            found: found.kind,
        }),
        Some(_) => Ok(()),
    }
}
