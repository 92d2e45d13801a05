//! Immutable syntax trees.
//!
//! - [`green`]: position-independent storage shared across snapshots
//! - [`syntax`]: positioned cursors (`SyntaxTree`, `NodeRef`, `NodePath`)
//! - [`builder`]: event-driven construction with trivia attachment
//! - [`notation`]: s-expression reader and writer
//! - [`factory`]: small subtrees for fix providers
//! - [`walk`]: visitor traversal

pub mod builder;
pub mod factory;
pub mod green;
pub mod kinds;
pub mod notation;
pub mod query;
pub mod syntax;
pub mod trivia;
pub mod walk;

use thiserror::Error;

pub use builder::TreeBuilder;
pub use green::{GreenNode, Trivia};
pub use kinds::{SyntaxKind, TriviaKind};
pub use syntax::{NodePath, NodeRef, SyntaxTree};
pub use walk::{walk, VisitResult, Visitor};

/// Errors from building or querying trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A location lookup fell outside the tree.
    #[error("offset {offset} is outside the tree (length {len})")]
    OutOfRangeLocation { offset: usize, len: usize },

    /// Input tree violates span structure. The only hard failure.
    #[error("span invariant violated at offset {offset}: {message}")]
    SpanInvariant { offset: usize, message: String },

    /// Builder events did not nest.
    #[error("unbalanced tree events: {message}")]
    Unbalanced { message: String },

    /// A node kind was used where a token kind belongs, or the reverse.
    #[error("expected a {expected}, found '{found}'")]
    KindMismatch { expected: String, found: String },

    /// Notation text could not be read.
    #[error("invalid tree notation at offset {offset}: {message}")]
    Notation { offset: usize, message: String },
}
