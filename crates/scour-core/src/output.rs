//! JSON output types and serialization for CLI responses.
//!
//! Every response starts with `status` and `schema_version`. Field order and
//! array order are deterministic: diagnostics come out of the sink sorted,
//! rules come out in registration order.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, ScourError};
use crate::registry::{Category, RegisteredRule, Subscription};
use crate::sink::{Diagnostic, Summary};
use crate::types::Severity;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit status.
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &ScourError) -> Self {
        let details = match err {
            ScourError::UnknownRule { id } => Some(serde_json::json!({ "rule": id })),
            ScourError::FileNotFound { path } => Some(serde_json::json!({ "path": path })),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &ScourError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// check
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub status: String,
    pub schema_version: String,
    /// Short content hash of the analyzed units.
    pub snapshot_id: String,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResponse {
    pub fn new(snapshot_id: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        CheckResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            snapshot_id: snapshot_id.into(),
            summary: Summary::of(&diagnostics),
            diagnostics,
        }
    }
}

// ============================================================================
// fix
// ============================================================================

/// Outcome of fix-all for one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedUnit {
    pub path: String,
    pub rounds: usize,
    pub applied: usize,
    pub deferred: usize,
    /// New text, present only when the unit changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixResponse {
    pub status: String,
    pub schema_version: String,
    pub rule: String,
    pub applied: usize,
    pub deferred: usize,
    /// True when the snapshot file was rewritten.
    pub written: bool,
    pub units: Vec<FixedUnit>,
}

impl FixResponse {
    pub fn new(rule: impl Into<String>, units: Vec<FixedUnit>, written: bool) -> Self {
        FixResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            rule: rule.into(),
            applied: units.iter().map(|u| u.applied).sum(),
            deferred: units.iter().map(|u| u.deferred).sum(),
            written,
            units,
        }
    }
}

// ============================================================================
// rules
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub title: String,
    pub category: Category,
    /// Effective severity after configuration.
    pub severity: Severity,
    pub enabled: bool,
    pub subscriptions: Vec<Subscription>,
    pub has_fix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

impl RuleInfo {
    pub fn from_entry(entry: &RegisteredRule) -> Self {
        let descriptor = entry.descriptor();
        RuleInfo {
            id: descriptor.id.to_string(),
            title: descriptor.title.to_string(),
            category: descriptor.category,
            severity: entry.severity(),
            enabled: entry.enabled(),
            subscriptions: descriptor.subscriptions.to_vec(),
            has_fix: entry.rule().fix().is_some(),
            help_url: descriptor.help_url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesResponse {
    pub status: String,
    pub schema_version: String,
    pub rules: Vec<RuleInfo>,
}

impl RulesResponse {
    pub fn new(rules: Vec<RuleInfo>) -> Self {
        RulesResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            rules,
        }
    }
}

// ============================================================================
// dump
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpedUnit {
    pub path: String,
    pub content_hash: String,
    /// The tree in s-expression notation.
    pub tree: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DumpResponse {
    pub status: String,
    pub schema_version: String,
    pub units: Vec<DumpedUnit>,
}

impl DumpResponse {
    pub fn new(units: Vec<DumpedUnit>) -> Self {
        DumpResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            units,
        }
    }
}

// ============================================================================
// Emitting
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
