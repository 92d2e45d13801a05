//! Built-in rules for scour.
//!
//! Each module holds one rule (and its fix provider, when it has one):
//!
//! | Id | Module |
//! |---|---|
//! | SC001 | [`async_suffix`] |
//! | SC002 | [`assert_message`] |
//! | SC003 | [`braces`] |
//! | SC004 | [`predefined_types`] |
//! | SC005 | [`params_in_loops`] |
//! | SC006-SC009 | [`assembly_attributes`] |
//! | SC010 | [`exception_docs`] |
//! | SC011 | [`suppression`] |
//! | SC012 | [`sealed_classes`] |
//! | SC013 | [`debugger_display`] |
//! | SC014 | [`catch_rethrow`] |

use std::collections::BTreeMap;

use scour_core::config::RuleSettings;
use scour_core::registry::RegistryError;
use scour_core::{Registry, Rule};

pub mod assembly_attributes;
pub mod assert_message;
pub mod async_suffix;
pub mod braces;
pub mod catch_rethrow;
pub mod debugger_display;
pub mod exception_docs;
pub mod params_in_loops;
pub mod predefined_types;
pub mod sealed_classes;
pub mod suppression;

mod support;

#[cfg(test)]
mod testing;

/// Every built-in rule, in id order.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(async_suffix::AsyncSuffix),
        Box::new(assert_message::AssertMessage),
        Box::new(braces::IfElseBraces),
        Box::new(predefined_types::PredefinedTypes),
        Box::new(params_in_loops::ParamsInLoops),
        Box::new(assembly_attributes::AssemblyAttribute::company()),
        Box::new(assembly_attributes::AssemblyAttribute::copyright()),
        Box::new(assembly_attributes::AssemblyAttribute::description()),
        Box::new(assembly_attributes::AssemblyAttribute::title()),
        Box::new(exception_docs::ExceptionDocs),
        Box::new(suppression::SuppressionJustification),
        Box::new(sealed_classes::SealedClasses),
        Box::new(debugger_display::DebuggerDisplay),
        Box::new(catch_rethrow::CatchRethrow),
    ]
}

/// Registry of every built-in rule with default settings.
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    builtin_registry_with(&BTreeMap::new())
}

/// Registry of every built-in rule with per-rule overrides applied.
pub fn builtin_registry_with(
    settings: &BTreeMap<String, RuleSettings>,
) -> Result<Registry, RegistryError> {
    builtin_rules()
        .into_iter()
        .fold(Registry::builder(), |builder, rule| builder.register_boxed(rule))
        .configure(settings)
        .build()
}
