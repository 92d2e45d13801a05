//! Error types and error code constants for scour.
//!
//! Each subsystem has its own `thiserror` enum (`TreeError`, `SymbolError`,
//! `RegistryError`, `RewriteError`, `ConfigError`). They are bridged into
//! `ScourError`, the single type rendered as JSON by the CLI.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, unknown rule, bad config)
//! - `3`: Resolution errors (input file not found)
//! - `4`: Invalid input (snapshot violates span or symbol structure)
//! - `5`: Fix failed (no fix available, stale fix target)
//! - `6`: Cancelled
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::rewrite::RewriteError;
use crate::symbols::SymbolError;
use crate::tree::TreeError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable numeric codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// An input file could not be found.
    ResolutionError = 3,
    /// The host snapshot is structurally corrupt.
    InvalidInput = 4,
    /// A fix could not be computed or applied.
    FixFailed = 5,
    /// The pass was cancelled.
    Cancelled = 6,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum ScourError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("unknown rule: {id}")]
    UnknownRule { id: String },

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The tree or symbol snapshot handed over by the host is corrupt. This
    /// points at the host parser or binder.
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    #[error("fix failed: {message}")]
    FixFailed { message: String },

    #[error("analysis cancelled")]
    Cancelled,

    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ScourError> for OutputErrorCode {
    fn from(err: &ScourError) -> Self {
        match err {
            ScourError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ScourError::UnknownRule { .. } => OutputErrorCode::InvalidArguments,
            ScourError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            ScourError::InvalidSnapshot { .. } => OutputErrorCode::InvalidInput,
            ScourError::FixFailed { .. } => OutputErrorCode::FixFailed,
            ScourError::Cancelled => OutputErrorCode::Cancelled,
            ScourError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ScourError> for OutputErrorCode {
    fn from(err: ScourError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<TreeError> for ScourError {
    fn from(err: TreeError) -> Self {
        ScourError::InvalidSnapshot {
            message: err.to_string(),
        }
    }
}

impl From<SymbolError> for ScourError {
    fn from(err: SymbolError) -> Self {
        ScourError::InvalidSnapshot {
            message: err.to_string(),
        }
    }
}

impl From<RegistryError> for ScourError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownRule(id) => ScourError::UnknownRule { id },
            RegistryError::DuplicateRule(id) => ScourError::InternalError {
                message: format!("rule {} registered twice", id),
            },
        }
    }
}

impl From<RewriteError> for ScourError {
    fn from(err: RewriteError) -> Self {
        ScourError::FixFailed {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for ScourError {
    fn from(err: ConfigError) -> Self {
        ScourError::InvalidArguments {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ScourError {
    fn from(err: serde_json::Error) -> Self {
        ScourError::InvalidSnapshot {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ScourError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ScourError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ScourError::FileNotFound { path: path.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ScourError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}
