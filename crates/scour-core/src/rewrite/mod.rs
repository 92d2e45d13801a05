//! Tree rewriting: patches, fix providers and fix-all.
//!
//! - [`apply`]: replace one subtree by path copying, optionally reindenting
//!   the replacement
//! - [`batch`]: conflict-free application of many patches and the fix-all
//!   loop
//! - [`format`]: indentation renormalization

pub mod batch;
pub mod format;

use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::warn;

use crate::sink::Diagnostic;
use crate::symbols::SemanticModel;
use crate::tree::{GreenNode, NodePath, NodeRef, SyntaxKind, SyntaxTree};
use crate::types::Span;

pub use batch::{apply_batch, fix_all, fix_one, BatchOutcome, FixAllReport, FixOptions};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The patch or diagnostic no longer matches the snapshot.
    #[error("invalid fix target: {message}")]
    InvalidFixTarget { message: String },

    #[error("rule {rule} has no fix")]
    NoFix { rule: String },

    #[error("diagnostic for rule {rule} has no location")]
    NoLocation { rule: String },
}

impl RewriteError {
    pub fn invalid_target(message: impl Into<String>) -> Self {
        RewriteError::InvalidFixTarget {
            message: message.into(),
        }
    }
}

// ============================================================================
// Patches
// ============================================================================

/// Replacement of one subtree of one snapshot.
#[derive(Debug, Clone)]
pub struct Patch {
    pub target: NodePath,
    pub target_kind: SyntaxKind,
    /// Full span (trivia included) of the target in its snapshot.
    pub target_span: Span,
    pub replacement: Arc<GreenNode>,
    /// Reindent the replacement's line-leading tokens on apply.
    pub reformat: bool,
    pub title: String,
}

impl Patch {
    /// Replace `node` with `replacement`.
    pub fn replace(node: &NodeRef<'_>, replacement: Arc<GreenNode>, title: impl Into<String>) -> Self {
        Patch {
            target: node.path().clone(),
            target_kind: node.kind(),
            target_span: node.full_span(),
            replacement,
            reformat: false,
            title: title.into(),
        }
    }

    pub fn reformatted(mut self) -> Self {
        self.reformat = true;
        self
    }

    /// The target in `tree`, if it is still the node this patch was made for.
    pub fn resolve<'t>(&self, tree: &'t SyntaxTree) -> Result<NodeRef<'t>, RewriteError> {
        let node = tree.node(&self.target).ok_or_else(|| {
            RewriteError::invalid_target(format!("no node at {}", self.target))
        })?;
        if node.kind() != self.target_kind || node.full_span() != self.target_span {
            return Err(RewriteError::invalid_target(format!(
                "expected {} at {}, found {} at {}",
                self.target_kind,
                self.target_span,
                node.kind(),
                node.full_span()
            )));
        }
        Ok(node)
    }
}

/// Options for applying patches.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// One level of indentation.
    pub indent_unit: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            indent_unit: "    ".to_string(),
        }
    }
}

/// Apply one patch, producing a new snapshot that shares every untouched
/// subtree with `tree`.
pub fn apply(tree: &SyntaxTree, patch: &Patch) -> Result<SyntaxTree, RewriteError> {
    apply_with(tree, patch, &RewriteOptions::default())
}

pub fn apply_with(
    tree: &SyntaxTree,
    patch: &Patch,
    options: &RewriteOptions,
) -> Result<SyntaxTree, RewriteError> {
    let replacement = prepare(tree, patch, options)?;
    let root = replace_at(tree.green(), patch.target.indices(), replacement);
    Ok(SyntaxTree::new(tree.path(), root))
}

/// Validate a patch against its snapshot and produce the green node that
/// goes in, reindented if asked.
pub(crate) fn prepare(
    tree: &SyntaxTree,
    patch: &Patch,
    options: &RewriteOptions,
) -> Result<Arc<GreenNode>, RewriteError> {
    let node = patch.resolve(tree)?;
    if patch.reformat {
        Ok(format::reindent(&node, &patch.replacement, &options.indent_unit))
    } else {
        Ok(Arc::clone(&patch.replacement))
    }
}

/// Rebuild the spine from the root down to `path`.
pub(crate) fn replace_at(node: &Arc<GreenNode>, path: &[u32], replacement: Arc<GreenNode>) -> Arc<GreenNode> {
    match path.split_first() {
        None => replacement,
        Some((&index, rest)) => {
            let index = index as usize;
            let child = replace_at(&node.children()[index], rest, replacement);
            node.with_child(index, child)
        }
    }
}

// ============================================================================
// Fix providers
// ============================================================================

/// Computes patches for a rule's diagnostics.
pub trait FixProvider: Send + Sync {
    fn title(&self) -> &str;

    /// One patch for one diagnostic computed against `tree`.
    fn compute(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        diagnostic: &Diagnostic,
    ) -> Result<Patch, RewriteError>;

    /// Patches for many diagnostics of the same snapshot, computed in
    /// parallel. Diagnostics that yield no fix are logged and skipped.
    fn compute_all(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        diagnostics: &[Diagnostic],
    ) -> Vec<Patch> {
        diagnostics
            .par_iter()
            .filter_map(|d| match self.compute(tree, model, d) {
                Ok(patch) => Some(patch),
                Err(err) => {
                    warn!(rule = %d.rule_id, file = tree.path(), %err, "no fix for diagnostic");
                    None
                }
            })
            .collect()
    }
}

/// Node of `kind` at the primary location of `diagnostic` in `tree`.
pub fn diagnostic_node<'t>(
    tree: &'t SyntaxTree,
    diagnostic: &Diagnostic,
    kind: SyntaxKind,
) -> Result<NodeRef<'t>, RewriteError> {
    let location = diagnostic.primary().ok_or_else(|| RewriteError::NoLocation {
        rule: diagnostic.rule_id.clone(),
    })?;
    if location.file != tree.path() {
        return Err(RewriteError::invalid_target(format!(
            "diagnostic is for {}, not {}",
            location.file,
            tree.path()
        )));
    }
    tree.find_node(location.span, kind).ok_or_else(|| {
        RewriteError::invalid_target(format!("no {} at {}", kind, location.span))
    })
}
