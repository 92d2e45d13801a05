//! Shared value types: spans, severities and content hashes.
//!
//! These types are used across the tree model, the diagnostic sink and
//! the rewrite engine, and form part of the JSON output contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into the text of one tree snapshot.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Create a span from a start offset and a length.
    pub fn at(start: usize, len: usize) -> Self {
        Span {
            start,
            end: start + len,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if `offset` falls inside `[start, end)`.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One replaced region: `old` in the previous snapshot now holds `new_len`
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEdit {
    pub old: Span,
    pub new_len: usize,
}

impl SpanEdit {
    fn shift(&self, offset: usize) -> usize {
        (offset + self.new_len).saturating_sub(self.old.len())
    }
}

/// Map a span of the previous snapshot into the edited one.
///
/// `edits` must be sorted and disjoint. Edits before the span move it, edits
/// inside it resize it. Returns `None` when an edit cuts across the span or
/// swallows it.
pub fn rebase_span(span: Span, edits: &[SpanEdit]) -> Option<Span> {
    let mut start = span.start;
    let mut end = span.end;
    for edit in edits {
        if edit.old.end <= span.start {
            start = edit.shift(start);
            end = edit.shift(end);
        } else if edit.old.start >= span.end {
            continue;
        } else if span.start <= edit.old.start && edit.old.end <= span.end {
            end = edit.shift(end);
        } else {
            return None;
        }
    }
    Some(Span::new(start, end))
}

// ============================================================================
// Severity
// ============================================================================

/// Severity attached to a rule and to every diagnostic it produces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message.
    Info,
    /// Probable problem.
    #[default]
    Warning,
    /// Definite problem.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Content Hash
// ============================================================================

/// SHA-256 of snapshot content, hex-encoded for JSON compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute the SHA-256 hash of the given bytes.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }

    /// Hash several chunks as one stream, each prefixed by its length.
    pub fn compute_all<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for chunk in chunks {
            hasher.update((chunk.len() as u64).to_le_bytes());
            hasher.update(chunk);
        }
        ContentHash(hex::encode(hasher.finalize()))
    }

    /// Short form used as a snapshot id in CLI responses.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod rebasing {
        use super::*;

        fn edit(start: usize, end: usize, new_len: usize) -> SpanEdit {
            SpanEdit {
                old: Span::new(start, end),
                new_len,
            }
        }

        #[test]
        fn edits_before_shift_and_inside_resize() {
            let edits = [edit(0, 2, 5), edit(10, 12, 0)];
            assert_eq!(rebase_span(Span::new(4, 8), &edits), Some(Span::new(7, 11)));
            assert_eq!(rebase_span(Span::new(4, 20), &edits), Some(Span::new(7, 21)));
            assert_eq!(rebase_span(Span::new(30, 31), &edits), Some(Span::new(31, 32)));
        }

        #[test]
        fn edits_after_are_ignored() {
            assert_eq!(
                rebase_span(Span::new(0, 3), &[edit(3, 5, 9)]),
                Some(Span::new(0, 3))
            );
        }

        #[test]
        fn crossing_or_swallowing_edit_drops_span() {
            assert_eq!(rebase_span(Span::new(4, 8), &[edit(6, 10, 1)]), None);
            assert_eq!(rebase_span(Span::new(4, 8), &[edit(2, 10, 1)]), None);
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn containment_includes_empty_spans() {
            let outer = Span::new(0, 10);
            assert!(outer.contains(&Span::new(3, 4)));
            assert!(outer.contains(&Span::new(4, 4)));
            assert!(!Span::new(3, 4).contains(&outer));
        }

        #[test]
        fn contains_offset_is_half_open() {
            let span = Span::at(2, 3);
            assert!(!span.contains_offset(1));
            assert!(span.contains_offset(2));
            assert!(span.contains_offset(4));
            assert!(!span.contains_offset(5));
        }

        #[test]
        #[should_panic(expected = "must be <= end")]
        fn inverted_span_panics() {
            let _ = Span::new(4, 2);
        }

        #[test]
        fn display_is_half_open() {
            assert_eq!(Span::new(3, 7).to_string(), "[3, 7)");
        }
    }

    mod severity_tests {
        use super::*;

        #[test]
        fn ordering_is_info_warning_error() {
            assert!(Severity::Info < Severity::Warning);
            assert!(Severity::Warning < Severity::Error);
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&Severity::Warning).unwrap();
            assert_eq!(json, "\"warning\"");
        }
    }

    mod hash_tests {
        use super::*;

        #[test]
        fn compute_is_stable() {
            let a = ContentHash::compute(b"class C {}");
            let b = ContentHash::compute(b"class C {}");
            assert_eq!(a, b);
            assert_eq!(a.0.len(), 64);
            assert_eq!(a.short().len(), 12);
        }

        #[test]
        fn compute_all_separates_chunks() {
            let joined = ContentHash::compute_all([b"ab".as_slice(), b"c".as_slice()]);
            let shifted = ContentHash::compute_all([b"a".as_slice(), b"bc".as_slice()]);
            assert_ne!(joined, shifted);
        }
    }
}
