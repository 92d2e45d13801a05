//! Scour - static analysis and automated fixes over host-parsed syntax trees.
//!
//! This crate provides the `scour` binary.
//!
//! ## Modules
//!
//! - `cli` - command implementations

pub mod cli;

// Re-export core types for convenience
pub use scour_core::error::{OutputErrorCode, ScourError};
pub use scour_core::output::{
    CheckResponse, DumpResponse, ErrorInfo, ErrorResponse, FixResponse, RulesResponse,
    SCHEMA_VERSION,
};
pub use scour_core::snapshot::CompilationSnapshot;
