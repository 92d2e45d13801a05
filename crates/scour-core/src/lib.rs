//! Core engine for scour.
//!
//! This crate provides the language-neutral substrate rules run on:
//! - Immutable syntax trees with attached trivia
//! - Symbol model behind the `SemanticModel` seam
//! - Generated-code exclusion
//! - Rule registry and parallel dispatch
//! - Diagnostic collection
//! - Tree rewriting, fix providers and fix-all
//! - Host snapshot import, configuration, errors and JSON output

pub mod config;
pub mod dispatch;
pub mod error;
pub mod exclusion;
pub mod output;
pub mod registry;
pub mod rewrite;
pub mod sink;
pub mod snapshot;
pub mod symbols;
pub mod text;
pub mod tree;
pub mod types;

pub use dispatch::{CancellationToken, DispatchOptions, Dispatcher};
pub use error::{OutputErrorCode, ScourError};
pub use registry::{Registry, Rule, RuleDescriptor};
pub use sink::{Diagnostic, DiagnosticSink, Summary};
pub use symbols::{SemanticModel, SymbolTable, Unbound};
pub use tree::{NodeRef, SyntaxKind, SyntaxTree};
pub use types::{Severity, Span};
