//! Generated and non-user code detection.
//!
//! Three independent signals, any of which excludes a location:
//!
//! - an ignorable attribute on the symbol, a containing type or the assembly
//! - an ignorable attribute list in the syntax of the node or a declaration
//!   that encloses it, or an `[assembly: ...]` list in the unit
//! - a generated-looking file name
//!
//! Exclusion is monotonic: once a scope is excluded nothing nested inside it
//! can opt back in.

use std::collections::HashMap;
use std::path::Path;

use crate::symbols::{AttributeData, SemanticModel, Symbol, SymbolId};
use crate::tree::query::{attribute_lists, attribute_name, attribute_target, attributes};
use crate::tree::{NodeRef, SyntaxKind, SyntaxTree};

/// Attribute name suffixes that mark generated or non-user code.
pub const IGNORABLE_ATTRIBUTE_SUFFIXES: &[&str] = &[
    "GeneratedCode",
    "GeneratedCodeAttribute",
    "DebuggerNonUserCode",
    "DebuggerNonUserCodeAttribute",
];

const GENERATED_FILE_PREFIX: &str = "TemporaryGeneratedFile_";

const GENERATED_STEM_SUFFIXES: &[&str] = &[
    "assemblyinfo",
    ".designer",
    ".generated",
    ".g",
    ".g.i",
    ".assemblyattributes",
];

/// True if an attribute name (as written or as a class name) is ignorable.
pub fn is_ignorable_attribute(name: &str) -> bool {
    IGNORABLE_ATTRIBUTE_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// True if any bound attribute is ignorable.
pub fn has_ignorable_attributes(attributes: &[AttributeData]) -> bool {
    attributes.iter().any(|a| is_ignorable_attribute(&a.class_name))
}

/// True if the file name looks generated.
///
/// The prefix is tested on the file name; the suffixes on the file name
/// without its extension, and only when it has one.
pub fn is_generated_file(path: &str) -> bool {
    let path = Path::new(path);
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    let lower = file_name.to_ascii_lowercase();
    if lower.starts_with(&GENERATED_FILE_PREFIX.to_ascii_lowercase()) {
        return true;
    }

    if path.extension().is_none() {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let stem = stem.to_ascii_lowercase();
    GENERATED_STEM_SUFFIXES
        .iter()
        .any(|suffix| stem.ends_with(suffix))
}

/// True if an attribute list in the syntax names an ignorable attribute.
pub fn list_is_ignorable(list: &NodeRef<'_>) -> bool {
    attributes(list)
        .iter()
        .filter_map(attribute_name)
        .any(is_ignorable_attribute)
}

/// True if a declaration node carries an ignorable attribute list.
pub fn declaration_is_ignorable(decl: &NodeRef<'_>) -> bool {
    attribute_lists(decl).iter().any(list_is_ignorable)
}

/// True if the unit has an ignorable `[assembly: ...]` attribute list.
pub fn unit_has_ignorable_assembly_attributes(tree: &SyntaxTree) -> bool {
    tree.root()
        .children_of_kind(SyntaxKind::AttributeList)
        .iter()
        .any(|list| attribute_target(list) == Some("assembly") && list_is_ignorable(list))
}

/// True if the compilation as a whole is generated code: any unit carries an
/// ignorable `[assembly: ...]` list, or the bound assembly has an ignorable
/// attribute. Every unit must be passed, including ones a caller will not
/// analyze.
pub fn is_compilation_excluded(units: &[SyntaxTree], model: &dyn SemanticModel) -> bool {
    units.iter().any(unit_has_ignorable_assembly_attributes)
        || model
            .assembly()
            .is_some_and(|asm| has_ignorable_attributes(&asm.attributes))
}

/// Memoizing exclusion test for one analysis pass.
pub struct ExclusionFilter<'m> {
    model: &'m dyn SemanticModel,
    symbols: HashMap<SymbolId, bool>,
    files: HashMap<String, bool>,
    units: HashMap<String, bool>,
}

impl<'m> ExclusionFilter<'m> {
    pub fn new(model: &'m dyn SemanticModel) -> Self {
        ExclusionFilter {
            model,
            symbols: HashMap::new(),
            files: HashMap::new(),
            units: HashMap::new(),
        }
    }

    /// Generated-file test, memoized per path.
    pub fn is_file_excluded(&mut self, path: &str) -> bool {
        if let Some(&hit) = self.files.get(path) {
            return hit;
        }
        let excluded = is_generated_file(path);
        self.files.insert(path.to_string(), excluded);
        excluded
    }

    /// Symbol test: own attributes, every containing type, the assembly, then
    /// each declaring file. Memoized per symbol id.
    pub fn is_symbol_excluded(&mut self, symbol: &Symbol) -> bool {
        if let Some(&hit) = self.symbols.get(&symbol.id) {
            return hit;
        }

        let model = self.model;
        let excluded = has_ignorable_attributes(&symbol.attributes)
            || model
                .containing_types(symbol)
                .iter()
                .any(|ty| has_ignorable_attributes(&ty.attributes))
            || model
                .containing_assembly(symbol)
                .is_some_and(|asm| has_ignorable_attributes(&asm.attributes))
            || symbol
                .locations
                .iter()
                .any(|loc| self.is_file_excluded(&loc.file));

        self.symbols.insert(symbol.id, excluded);
        excluded
    }

    /// Whole-unit test: file name, assembly-level syntax attributes and the
    /// bound assembly's attributes.
    pub fn is_unit_excluded(&mut self, tree: &SyntaxTree) -> bool {
        if let Some(&hit) = self.units.get(tree.path()) {
            return hit;
        }
        let excluded = self.is_file_excluded(tree.path())
            || unit_has_ignorable_assembly_attributes(tree)
            || self
                .model
                .assembly()
                .is_some_and(|asm| has_ignorable_attributes(&asm.attributes));
        self.units.insert(tree.path().to_string(), excluded);
        excluded
    }

    /// True if this node opens an excluded scope: it carries an ignorable
    /// attribute list or declares an excluded symbol.
    pub fn opens_excluded_scope(&mut self, tree: &SyntaxTree, node: &NodeRef<'_>) -> bool {
        let kind = node.kind();
        if !(kind.is_type_declaration() || kind.is_member_declaration() || kind.declares_symbol()) {
            return false;
        }
        if declaration_is_ignorable(node) {
            return true;
        }
        let model = self.model;
        match model.declared_symbol(tree, node) {
            Some(symbol) => self.is_symbol_excluded(symbol),
            None => false,
        }
    }

    /// Full node test, for callers outside a traversal: the unit, then the
    /// node and every enclosing declaration.
    pub fn is_node_excluded(&mut self, tree: &SyntaxTree, node: &NodeRef<'_>) -> bool {
        if self.is_unit_excluded(tree) {
            return true;
        }
        if self.opens_excluded_scope(tree, node) {
            return true;
        }
        node.ancestors()
            .iter()
            .any(|a| self.opens_excluded_scope(tree, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{DeclarationLocation, SymbolKind, SymbolTable, Unbound};
    use crate::tree::notation::parse_tree;
    use crate::types::Span;

    mod file_names {
        use super::*;

        #[test]
        fn generated_suffixes_need_an_extension() {
            assert!(is_generated_file("Form1.Designer.cs"));
            assert!(is_generated_file("obj/Debug/Views.g.cs"));
            assert!(is_generated_file("Views.g.i.cs"));
            assert!(is_generated_file("Properties/AssemblyInfo.cs"));
            assert!(is_generated_file("net8.0.AssemblyAttributes.cs"));
            assert!(is_generated_file("Api.generated.cs"));
            assert!(!is_generated_file("Views.g"));
            assert!(!is_generated_file("Program.cs"));
            assert!(!is_generated_file("Designer.cs"));
        }

        #[test]
        fn prefix_is_case_insensitive_on_file_name() {
            assert!(is_generated_file("temporarygeneratedfile_1234.cs"));
            assert!(is_generated_file("obj/TemporaryGeneratedFile_abc"));
            assert!(!is_generated_file("TemporaryGeneratedFile_/Program.cs"));
        }
    }

    mod attributes {
        use super::*;

        #[test]
        fn suffix_match_is_ordinal() {
            assert!(is_ignorable_attribute("System.CodeDom.Compiler.GeneratedCode"));
            assert!(is_ignorable_attribute("GeneratedCodeAttribute"));
            assert!(is_ignorable_attribute("DebuggerNonUserCode"));
            assert!(!is_ignorable_attribute("generatedcode"));
            assert!(!is_ignorable_attribute("GeneratedCodeHelper"));
        }
    }

    mod symbols {
        use super::*;

        fn table(outer_attr: bool) -> SymbolTable {
            let mut outer = Symbol::new(1, SymbolKind::NamedType, "Outer");
            if outer_attr {
                outer.attributes.push(AttributeData::new("GeneratedCode"));
            }
            let mut inner = Symbol::new(2, SymbolKind::NamedType, "Inner");
            inner.containing_type = Some(SymbolId(1));
            let mut method = Symbol::new(3, SymbolKind::Method, "Run");
            method.containing_type = Some(SymbolId(2));
            method.locations.push(DeclarationLocation {
                file: "Run.cs".to_string(),
                span: Span::new(0, 3),
            });
            SymbolTable::builder()
                .symbol(outer)
                .symbol(inner)
                .symbol(method)
                .build()
                .unwrap()
        }

        #[test]
        fn outer_type_excludes_nested_members() {
            let table = table(true);
            let mut filter = ExclusionFilter::new(&table);
            let run = table.symbol(SymbolId(3)).unwrap();
            assert!(filter.is_symbol_excluded(run));
        }

        #[test]
        fn clean_chain_is_not_excluded() {
            let table = table(false);
            let mut filter = ExclusionFilter::new(&table);
            let run = table.symbol(SymbolId(3)).unwrap();
            assert!(!filter.is_symbol_excluded(run));
        }

        #[test]
        fn assembly_attribute_excludes_everything() {
            let mut asm = Symbol::new(0, SymbolKind::Assembly, "App");
            asm.attributes
                .push(AttributeData::new("System.Diagnostics.DebuggerNonUserCodeAttribute"));
            let table = SymbolTable::builder()
                .symbol(asm)
                .symbol(Symbol::new(1, SymbolKind::NamedType, "C"))
                .build()
                .unwrap();
            let mut filter = ExclusionFilter::new(&table);
            assert!(filter.is_symbol_excluded(table.symbol(SymbolId(1)).unwrap()));
        }

        #[test]
        fn declaring_file_excludes() {
            let mut c = Symbol::new(1, SymbolKind::NamedType, "C");
            c.locations.push(DeclarationLocation {
                file: "C.designer.cs".to_string(),
                span: Span::new(0, 1),
            });
            let table = SymbolTable::builder().symbol(c).build().unwrap();
            let mut filter = ExclusionFilter::new(&table);
            assert!(filter.is_symbol_excluded(table.symbol(SymbolId(1)).unwrap()));
        }
    }

    mod syntax {
        use super::*;

        const NESTED: &str = r#"
            (compilation_unit
              (class_declaration
                (attribute_list "[" (attribute (identifier_name "GeneratedCode")) "]" "\n")
                "class " "Outer" " " "{" "\n"
                (class_declaration
                  (attribute_list "[" (attribute (identifier_name "Serializable")) "]" "\n")
                  "class " "Inner" " " "{" "\n"
                  (method_declaration "void " "M" (parameter_list "(" ")") " " (block "{" "}") "\n")
                  "}" "\n")
                "}"))
        "#;

        #[test]
        fn enclosing_declaration_excludes_node() {
            let tree = parse_tree("Outer.cs", NESTED).unwrap();
            let method = tree.root().descendants_of_kind(SyntaxKind::MethodDeclaration)[0].clone();
            let mut filter = ExclusionFilter::new(&Unbound);
            assert!(filter.is_node_excluded(&tree, &method));
        }

        #[test]
        fn only_the_marked_declaration_opens_a_scope() {
            let tree = parse_tree("Outer.cs", NESTED).unwrap();
            let classes = tree.root().descendants_of_kind(SyntaxKind::ClassDeclaration);
            let mut filter = ExclusionFilter::new(&Unbound);
            assert!(filter.opens_excluded_scope(&tree, &classes[0]));
            assert!(!filter.opens_excluded_scope(&tree, &classes[1]));
        }

        #[test]
        fn assembly_attribute_list_excludes_unit() {
            let tree = parse_tree(
                "App.cs",
                r#"(compilation_unit
                     (attribute_list "[" (attribute_target_specifier "assembly" ": ")
                       (attribute (identifier_name "GeneratedCode")) "]" "\n")
                     (class_declaration "class " "C" " " "{" "}"))"#,
            )
            .unwrap();
            let class = tree.root().descendants_of_kind(SyntaxKind::ClassDeclaration)[0].clone();
            let mut filter = ExclusionFilter::new(&Unbound);
            assert!(filter.is_unit_excluded(&tree));
            assert!(filter.is_node_excluded(&tree, &class));
        }

        #[test]
        fn assembly_marker_in_any_unit_excludes_compilation() {
            let marker = parse_tree(
                "obj/Marker.cs",
                r#"(compilation_unit
                     (attribute_list "[" (attribute_target_specifier "assembly" ": ")
                       (attribute (identifier_name "GeneratedCode")) "]" "\n"))"#,
            )
            .unwrap();
            let work = parse_tree("Work.cs", r#"(compilation_unit (class_declaration "class " "C" "{" "}"))"#).unwrap();
            assert!(!is_compilation_excluded(std::slice::from_ref(&work), &Unbound));
            assert!(is_compilation_excluded(&[work, marker], &Unbound));
        }

        #[test]
        fn generated_file_name_excludes_unit() {
            let tree = parse_tree("Form1.Designer.cs", r#"(compilation_unit (class_declaration "class " "C" "{" "}"))"#).unwrap();
            let mut filter = ExclusionFilter::new(&Unbound);
            assert!(filter.is_unit_excluded(&tree));
        }
    }
}
