//! SC001: methods returning a task must be named `...Async`.

use std::sync::LazyLock;

use regex::Regex;
use scour_core::registry::{Category, RuleDescriptor, RuleOutcome, Subscription, SymbolContext};
use scour_core::rewrite::{FixProvider, Patch, RewriteError};
use scour_core::sink::Diagnostic;
use scour_core::symbols::SymbolKind;
use scour_core::tree::query;
use scour_core::{Rule, SemanticModel, Severity, SyntaxKind, SyntaxTree};

use crate::support::{at_name, name_text, named_declaration};

static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "SC001",
    title: "Methods returning a task need the Async suffix",
    message_template: "Method name {0} should be renamed {0}Async",
    category: Category::Usage,
    severity: Severity::Error,
    subscriptions: &[Subscription::Symbol(SymbolKind::Method)],
    help_url: None,
};

/// Simple names of task types, including metadata arity suffixes.
static TASK_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Value)?Task(`\d+)?$").unwrap());

/// Assemblies the framework task types can come from.
static TASK_ASSEMBLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(mscorlib|netstandard|System\.Runtime|System\.Private\.CoreLib|System\.Threading\.Tasks(\.Extensions)?)$")
        .unwrap()
});

const SUFFIX: &str = "Async";

pub struct AsyncSuffix;

impl Rule for AsyncSuffix {
    fn descriptor(&self) -> &RuleDescriptor {
        &DESCRIPTOR
    }

    fn check_symbol(&self, ctx: &SymbolContext<'_>) -> RuleOutcome {
        let Some((_, decl)) = &ctx.declaration else {
            return Ok(Vec::new());
        };
        if decl.kind() != SyntaxKind::MethodDeclaration {
            return Ok(Vec::new());
        }
        let Some(returns) = &ctx.symbol.return_type else {
            return Ok(Vec::new());
        };
        if returns
            .assembly
            .as_deref()
            .is_some_and(|assembly| !TASK_ASSEMBLY.is_match(assembly))
        {
            return Ok(Vec::new());
        }
        if !TASK_TYPE.is_match(returns.simple_name()) {
            return Ok(Vec::new());
        }

        // The name as written, so that a renamed declaration is not reported
        // again from a stale symbol.
        let name = name_text(decl).unwrap_or(&ctx.symbol.name);
        if name.ends_with(SUFFIX) {
            return Ok(Vec::new());
        }
        Ok(vec![at_name(decl).arg(name)])
    }

    fn fix(&self) -> Option<&dyn FixProvider> {
        Some(self)
    }
}

impl FixProvider for AsyncSuffix {
    fn title(&self) -> &str {
        "Add the Async suffix"
    }

    fn compute(
        &self,
        tree: &SyntaxTree,
        _model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError> {
        let decl = named_declaration(tree, diagnostic, SyntaxKind::MethodDeclaration)?;
        let name = query::declaration_name(&decl)
            .ok_or_else(|| RewriteError::invalid_target("method has no name"))?;
        let written = name.text();
        if written.ends_with(SUFFIX) {
            return Err(RewriteError::invalid_target(format!(
                "{} already ends in {}",
                written, SUFFIX
            )));
        }
        let renamed = format!("{}{}", written, SUFFIX);
        let replacement = name.green().with_token_text(renamed.as_str());
        Ok(Patch::replace(&name, replacement, format!("Rename to {}", renamed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{declared_at, table, tree, Harness, FILE};
    use pretty_assertions::assert_eq;
    use scour_core::symbols::{Symbol, TypeRef};
    use scour_core::types::SpanEdit;
    use scour_core::Unbound;

    const SERVICE: &str = r#"
        (class_declaration "class " "Service" " " "{" "\n"
          (method_declaration "    " "public " (identifier_name "Task ") "Load" (parameter_list "(" ")") " " (block "{ " "}" "\n"))
          (method_declaration "    " "public " (identifier_name "Task ") "SaveAsync" (parameter_list "(" ")") " " (block "{ " "}" "\n"))
          (method_declaration "    " "public " (identifier_name "Job ") "Run" (parameter_list "(" ")") " " (block "{ " "}" "\n"))
          "}")
    "#;

    fn method(id: u32, name: &str, returns: &str, assembly: &str) -> Symbol {
        let mut symbol = Symbol::new(id, SymbolKind::Method, name);
        symbol.return_type = Some(TypeRef {
            name: returns.to_string(),
            assembly: Some(assembly.to_string()),
        });
        symbol
    }

    fn model(tree: &SyntaxTree, third_return: (&str, &str)) -> scour_core::SymbolTable {
        let decls = tree.root().descendants_of_kind(SyntaxKind::MethodDeclaration);
        table(vec![
            declared_at(method(1, "Load", "System.Threading.Tasks.Task", "mscorlib"), &decls[0]),
            declared_at(
                method(2, "SaveAsync", "System.Threading.Tasks.Task", "mscorlib"),
                &decls[1],
            ),
            declared_at(method(3, "Run", third_return.0, third_return.1), &decls[2]),
        ])
    }

    #[test]
    fn task_returning_method_without_suffix_is_reported() {
        let tree = tree(SERVICE);
        let model = model(&tree, ("Jobs.Job", "Jobs"));
        let diagnostics = Harness::new(AsyncSuffix).check(&tree, &model);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Method name Load should be renamed LoadAsync"
        );
        assert_eq!(diagnostics[0].locations[0].line, 2);
    }

    #[test]
    fn task_types_from_other_assemblies_are_ignored() {
        let tree = tree(SERVICE);
        let model = model(&tree, ("Fake.Task", "Fakes"));
        let diagnostics = Harness::new(AsyncSuffix).check(&tree, &model);
        assert_eq!(diagnostics.len(), 1);

        let model = model_with_value_task(&tree);
        let diagnostics = Harness::new(AsyncSuffix).check(&tree, &model);
        assert_eq!(diagnostics.len(), 2);
    }

    fn model_with_value_task(tree: &SyntaxTree) -> scour_core::SymbolTable {
        model(tree, ("System.Threading.Tasks.ValueTask`1", "System.Runtime"))
    }

    #[test]
    fn unbound_methods_are_not_reported() {
        let tree = tree(SERVICE);
        assert!(Harness::new(AsyncSuffix).check(&tree, &Unbound).is_empty());
    }

    #[test]
    fn fix_renames_the_declaration() {
        let tree = tree(SERVICE);
        let model = model(&tree, ("Jobs.Job", "Jobs"));
        let harness = Harness::new(AsyncSuffix);
        let diagnostics = harness.check(&tree, &model);
        let fixed = harness.fix(&tree, &model, &diagnostics[0]);
        assert!(fixed.text().contains("public Task LoadAsync() { }"));

        let edit = SpanEdit {
            old: diagnostics[0].locations[0].span,
            new_len: "LoadAsync".len(),
        };
        let rebased = model.rebased(FILE, &[edit]);
        assert!(harness.check(&fixed, &rebased).is_empty());
    }
}
