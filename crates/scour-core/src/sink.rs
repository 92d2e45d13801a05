//! Diagnostics and the thread-safe collector rules report into.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::SyntaxTree;
use crate::types::{Severity, Span};

/// Where a diagnostic points: a span in one snapshot plus its 1-indexed
/// line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagnosticLocation {
    pub file: String,
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl DiagnosticLocation {
    /// Location of `span` in `tree`, or `None` if the span does not fit the
    /// snapshot text.
    pub fn in_tree(tree: &SyntaxTree, span: Span) -> Option<Self> {
        let text = tree.text();
        if span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            debug!(file = tree.path(), %span, "dropping location outside snapshot");
            return None;
        }
        let (line, column) = tree.position(span.start);
        Some(DiagnosticLocation {
            file: tree.path().to_string(),
            span,
            line,
            column,
        })
    }
}

/// One reported rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
    /// Primary location first. Empty for compilation-level findings.
    pub locations: Vec<DiagnosticLocation>,
    /// Message arguments, kept for fix providers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn primary(&self) -> Option<&DiagnosticLocation> {
        self.locations.first()
    }

    fn sort_key(&self) -> (&str, usize, &str) {
        match self.primary() {
            Some(loc) => (loc.file.as_str(), loc.span.start, self.rule_id.as_str()),
            None => ("", 0, self.rule_id.as_str()),
        }
    }
}

/// Append-only diagnostic collector shared by concurrent rule invocations.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }

    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.lock().extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything reported so far, sorted by (file, span start, rule
    /// id). The sort is stable, so equal keys keep report order.
    pub fn drain(&self) -> Vec<Diagnostic> {
        let mut out = std::mem::take(&mut *self.lock());
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl Summary {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Summary::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }

    /// Process exit status for `scour check`: 1 when any error was reported.
    pub fn exit_code(&self) -> u8 {
        if self.errors > 0 {
            1
        } else {
            0
        }
    }
}
