//! SC006-SC009: assemblies carry filled-out identity attributes.

use scour_core::registry::{Category, Finding, RuleDescriptor, RuleOutcome, Subscription, SymbolContext};
use scour_core::symbols::SymbolKind;
use scour_core::{Rule, Severity};

const ASSEMBLY: &[Subscription] = &[Subscription::Symbol(SymbolKind::Assembly)];

static COMPANY: RuleDescriptor = RuleDescriptor {
    id: "SC006",
    title: "Assemblies need a company attribute",
    message_template: "Add a filled out AssemblyCompanyAttribute to the assembly properties",
    category: Category::Design,
    severity: Severity::Warning,
    subscriptions: ASSEMBLY,
    help_url: None,
};

static COPYRIGHT: RuleDescriptor = RuleDescriptor {
    id: "SC007",
    title: "Assemblies need a copyright attribute",
    message_template: "Add a filled out AssemblyCopyrightAttribute to the assembly properties",
    category: Category::Design,
    severity: Severity::Warning,
    subscriptions: ASSEMBLY,
    help_url: None,
};

static DESCRIPTION: RuleDescriptor = RuleDescriptor {
    id: "SC008",
    title: "Assemblies need a description attribute",
    message_template: "Add a filled out AssemblyDescriptionAttribute to the assembly properties",
    category: Category::Design,
    severity: Severity::Warning,
    subscriptions: ASSEMBLY,
    help_url: None,
};

static TITLE: RuleDescriptor = RuleDescriptor {
    id: "SC009",
    title: "Assemblies need a title attribute",
    message_template: "Add a filled out AssemblyTitleAttribute to the assembly properties",
    category: Category::Design,
    severity: Severity::Warning,
    subscriptions: ASSEMBLY,
    help_url: None,
};

/// Requires one assembly attribute with exactly one non-blank constructor
/// argument. Findings are compilation-level and carry no location.
pub struct AssemblyAttribute {
    descriptor: &'static RuleDescriptor,
    attribute: &'static str,
}

impl AssemblyAttribute {
    pub fn company() -> Self {
        AssemblyAttribute {
            descriptor: &COMPANY,
            attribute: "AssemblyCompany",
        }
    }

    pub fn copyright() -> Self {
        AssemblyAttribute {
            descriptor: &COPYRIGHT,
            attribute: "AssemblyCopyright",
        }
    }

    pub fn description() -> Self {
        AssemblyAttribute {
            descriptor: &DESCRIPTION,
            attribute: "AssemblyDescription",
        }
    }

    pub fn title() -> Self {
        AssemblyAttribute {
            descriptor: &TITLE,
            attribute: "AssemblyTitle",
        }
    }

    /// Attribute class name without the `Attribute` suffix.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }
}

impl Rule for AssemblyAttribute {
    fn descriptor(&self) -> &RuleDescriptor {
        self.descriptor
    }

    fn check_symbol(&self, ctx: &SymbolContext<'_>) -> RuleOutcome {
        let filled = ctx.symbol.attribute(self.attribute).is_some_and(|data| {
            matches!(data.constructor_args.as_slice(), [value] if !value.trim().is_empty())
        });
        if filled {
            Ok(Vec::new())
        } else {
            Ok(vec![Finding::unlocated()])
        }
    }
}
